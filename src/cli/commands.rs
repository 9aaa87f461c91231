use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::core::{
    ArticleSource, AppState, Dispatcher, DryRun, FeedGenerator, JsonArticleSource, Server,
    TagTable,
};
use crate::core::webhook::parse_payload;
use crate::models::{Config, Env};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 指定站点目录
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 启动 webhook 与 RSS 服务
    Serve(ServeArgs),

    /// 生成某个语言的 RSS 订阅
    Feed(FeedArgs),

    /// 预演一次 webhook，打印将要失效的路径与标签
    Revalidate(RevalidateArgs),

    /// 校验配置与环境变量
    Check,
}

#[derive(Args)]
pub struct ServeArgs {
    /// 服务器端口，默认取配置文件
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args)]
pub struct FeedArgs {
    /// 站点语言
    pub locale: String,

    /// 输出文件，默认打印到标准输出
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct RevalidateArgs {
    /// webhook 负载（JSON 文件）
    pub payload: PathBuf,
}

fn article_source(site_path: &Path, config: &Config) -> Arc<dyn ArticleSource> {
    Arc::new(JsonArticleSource::new(site_path.join(&config.feed.articles)))
}

/// 执行命令
pub async fn execute(cli: Cli) -> Result<()> {
    let site_path = cli.path.clone();
    let mut env = Env::from_env();

    match cli.command {
        Commands::Serve(args) => {
            let config = Config::load(&site_path, &env)?;
            let source = article_source(&site_path, &config);
            let server = Server::new(AppState::new(config, source));
            server.start(args.port).await?;
        }
        Commands::Feed(args) => {
            // 离线命令不需要 webhook 密钥
            env.skip_validation = true;
            let config = Config::load(&site_path, &env)?;
            if !config.i18n.is_supported(&args.locale) {
                bail!("不支持的语言: {}", args.locale);
            }

            let source = article_source(&site_path, &config);
            let generator = FeedGenerator::new(&config);
            let articles = source.recent_articles(&args.locale, generator.limit)?;
            let rss = generator.rss(&args.locale, &articles);

            match args.output {
                Some(output) => {
                    fs::write(&output, rss)
                        .with_context(|| format!("写入失败: {}", output.display()))?;
                    info!("Wrote {} articles to {}", articles.len(), output.display());
                }
                None => println!("{}", rss),
            }
        }
        Commands::Revalidate(args) => {
            env.skip_validation = true;
            let config = Config::load(&site_path, &env)?;
            let body = fs::read(&args.payload)
                .with_context(|| format!("读取负载失败: {}", args.payload.display()))?;
            let notification = parse_payload(&body)?;

            println!(
                "{} {}",
                "Revalidating".bright_cyan(),
                notification.entity_type().to_string().bright_white()
            );
            let dispatcher = Dispatcher::new(
                Arc::new(TagTable::standard()),
                Arc::new(config.i18n.clone()),
                Arc::new(DryRun::new()),
            );
            dispatcher.dispatch(notification)?;
        }
        Commands::Check => {
            let config = Config::load(&site_path, &env)?;
            println!("{} {}", "Site URL:".bright_white(), config.site_url());
            println!(
                "{} {} (default {})",
                "Locales:".bright_white(),
                config.i18n.locales.join(", "),
                config.i18n.default_locale
            );
            println!(
                "{} {}",
                "Articles:".bright_white(),
                site_path.join(&config.feed.articles).display()
            );
            println!("{}", "Configuration OK".bright_green());
        }
    }

    Ok(())
}
