//! # EZ 节点集 — 命令行入口
//!
//! 本文件仅负责日志初始化、参数解析与节点调用，
//! 节点逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;

use ez_nodes::background::{RembgCommand, remove_background};
use ez_nodes::dict::{self, DEFAULT_IMAGE_FORMAT, DEFAULT_IMAGE_QUALITY, Dict};
use ez_nodes::error::NodeError;
use ez_nodes::http_post::http_post;
use ez_nodes::image_loader::{
    ENV_S3_ENDPOINT, ENV_S3_REGION, ImageLoader, LoaderConfig, S3Settings,
};
use ez_nodes::nodes::NODE_REGISTRY;
use ez_nodes::object_store::S3ObjectStore;
use ez_nodes::s3_upload::{DEFAULT_OBJECT_NAME, DEFAULT_REGION, upload_image_and_video};
use ez_nodes::tensor::ImageBatch;

#[derive(Debug, Parser)]
#[command(name = "ez-nodes", version, about = "Run EZ plugin nodes from the command line")]
struct Cli {
    /// 网络下载超时（秒）
    #[arg(long, global = true, default_value_t = 5)]
    timeout_secs: u64,

    /// S3 兼容存储 endpoint
    #[arg(long, global = true, env = ENV_S3_ENDPOINT)]
    s3_endpoint: Option<String>,

    /// S3 区域
    #[arg(long, global = true, env = ENV_S3_REGION)]
    s3_region: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 列出已注册节点
    Nodes,
    /// 加载单张图片（Data URI / s3:// / http(s)://）
    Load {
        locator: String,
        /// 将归一化后的图像另存为文件
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// 按行批量加载图片
    LoadBatch {
        /// 每行一个定位符的文本文件
        file: PathBuf,
    },
    /// 把 JSON 字典 POST 到指定地址
    Post {
        url: String,
        #[arg(long, default_value = "{}")]
        body: String,
    },
    /// 加载图片并以 Data URI 写入字典
    AssocImg {
        locator: String,
        #[arg(long)]
        key: String,
        #[arg(long, default_value = "{}")]
        dict: String,
        #[arg(long, default_value = DEFAULT_IMAGE_FORMAT)]
        format: String,
        #[arg(long, default_value_t = DEFAULT_IMAGE_QUALITY)]
        quality: u8,
    },
    /// 上传图片 + 视频到对象存储
    Upload {
        #[arg(long)]
        bucket: String,
        #[arg(long, default_value = DEFAULT_OBJECT_NAME)]
        object_name: String,
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,
        #[arg(long, default_value = "")]
        endpoint_url: String,
        /// 第 1 个为图片，第 2 个为视频
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
    },
    /// 加载图片并移除背景，输出 RGBA PNG
    RemoveBg {
        locator: String,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = "rembg")]
        program: PathBuf,
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("节点执行失败 [{}]: {err}", err.code());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), NodeError> {
    let config = LoaderConfig {
        fetch_timeout: Duration::from_secs(cli.timeout_secs),
        s3: S3Settings {
            endpoint_url: cli.s3_endpoint,
            region: cli.s3_region,
        },
        ..LoaderConfig::default()
    };

    match cli.command {
        Command::Nodes => {
            println!("{}", serde_json::to_string_pretty(NODE_REGISTRY)?);
        }
        Command::Load { locator, out } => {
            let loader = ImageLoader::new(config)?;
            let loaded = loader.load_image(&locator).await?;
            if let Some(path) = out {
                save_frame(&loaded.image, &path)?;
            }
            println!(
                "{}",
                json!({
                    "image": shape_of(&loaded.image),
                    "mask": loaded.mask.shape(),
                })
            );
        }
        Command::LoadBatch { file } => {
            let text = std::fs::read_to_string(&file)?;
            let loader = ImageLoader::new(config)?;
            let batch = loader.load_batch(&text).await?;
            println!("{}", json!({ "images": shape_of(&batch) }));
        }
        Command::Post { url, body } => {
            let body: Dict = serde_json::from_str(&body)?;
            let status = http_post(&reqwest::Client::new(), &url, &body).await?;
            println!("{}", json!({ "status_code": status }));
        }
        Command::AssocImg {
            locator,
            key,
            dict: base,
            format,
            quality,
        } => {
            let base: Dict = serde_json::from_str(&base)?;
            let loader = ImageLoader::new(config)?;
            let loaded = loader.load_image(&locator).await?;
            let next = dict::assoc_img(&base, &key, &loaded.image, &format, quality)?;
            println!("{}", serde_json::to_string(&next)?);
        }
        Command::Upload {
            bucket,
            object_name,
            region,
            endpoint_url,
            files,
        } => {
            let store = S3ObjectStore::connect(&S3Settings::new(endpoint_url, region)).await;
            let outcome = upload_image_and_video(&store, &files, &bucket, &object_name).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::RemoveBg {
            locator,
            out,
            program,
            model,
        } => {
            let loader = ImageLoader::new(config)?;
            let loaded = loader.load_image(&locator).await?;

            let mut remover = RembgCommand::new().with_program(program);
            if let Some(model) = model {
                remover = remover.with_model(model);
            }
            let (image, with_alpha) = remove_background(&remover, &loaded.image).await?;
            save_rgba_frame(&with_alpha, &out)?;
            println!(
                "{}",
                json!({ "image": shape_of(&image), "image_with_alpha": shape_of(&with_alpha) })
            );
        }
    }

    Ok(())
}

fn shape_of(batch: &ImageBatch) -> [usize; 4] {
    let (b, h, w, c) = batch.shape();
    [b, h, w, c]
}

fn save_frame(batch: &ImageBatch, path: &Path) -> Result<(), NodeError> {
    batch
        .frame_to_rgb8(0)?
        .save(path)
        .map_err(|e| NodeError::Encode(e.to_string()))
}

fn save_rgba_frame(batch: &ImageBatch, path: &Path) -> Result<(), NodeError> {
    let frame = batch
        .frame(0)
        .ok_or_else(|| NodeError::Encode("批次为空".to_string()))?;
    let (height, width, channels) = frame.dim();
    let rgba = image::RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let mut px = [255u8; 4];
        for (c, slot) in px.iter_mut().enumerate().take(channels.min(4)) {
            *slot = ez_nodes::tensor::to_u8(frame[[y, x, c]]);
        }
        image::Rgba(px)
    });
    rgba.save(path).map_err(|e| NodeError::Encode(e.to_string()))
}
