use anyhow::Result;
use clap::{Parser, Subcommand};

use quiz_chain_solver::utils::logging;
use quiz_chain_solver::{App, Config};

#[derive(Parser)]
#[command(name = "quiz-chain-solver", version, about = "LLM 驱动的链式答题服务")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// 启动 HTTP 接收端（默认）
    Serve {
        /// 监听地址，覆盖 BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },
    /// 同步求解一条题目链并输出汇总
    Solve {
        /// 第一题地址
        url: String,
        /// 提交用邮箱，默认取配置
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let app = App::initialize(config)?;
    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => app.serve(bind.as_deref()).await?,
        Command::Solve { url, email } => {
            let report = app.solve_once(&url, email).await;
            println!("{report}");
        }
    }

    Ok(())
}
