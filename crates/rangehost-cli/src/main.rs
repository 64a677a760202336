//! Rangehost CLI
//!
//! 命令行客户端，上传文件或断点续传下载

mod client;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rangehost", version, about = "Rangehost 文件服务器客户端")]
struct Cli {
    /// 服务器地址
    #[arg(
        short,
        long,
        env = "RANGEHOST_URL",
        default_value = "http://127.0.0.1:8111"
    )]
    server: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 健康检查
    Hello,
    /// 上传文件
    Upload {
        /// 要上传的文件路径
        file: PathBuf,
    },
    /// 下载文件
    Download {
        /// 服务器上的文件名
        name: String,
        /// 保存路径 (默认: 当前目录下同名文件)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// 从本地已有部分继续下载
        #[arg(short, long)]
        resume: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = client::Client::new(&cli.server)?;

    match cli.command {
        Commands::Hello => {
            let reply = client.hello().await?;
            println!("{reply}");
        }
        Commands::Upload { file } => {
            println!("📤 上传文件: {}", file.display());
            let stored = client.upload(&file).await?;
            println!("   已保存为: {stored}");
        }
        Commands::Download {
            name,
            output,
            resume,
        } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&name));
            println!("📥 下载 {} -> {}", name, output.display());
            let outcome = client.download(&name, &output, resume).await?;
            if outcome.resumed {
                println!("   续传 {} 字节", outcome.written);
            } else {
                println!("   写入 {} 字节", outcome.written);
            }
            if let Some(range) = outcome.content_range {
                println!("   {range}");
            }
        }
    }

    Ok(())
}
