//! 资源文件存储 - 基础设施层
//!
//! 以 URL 最后一个路径段作为文件名保存音频/图片。
//! 目标文件存在即代表下载完成，没有额外的元数据。
//! 下载先写入同目录下的临时文件，成功后原子重命名到目标路径，
//! 失败时临时文件随 `NamedTempFile` 一起丢弃，目标路径上永远不会出现半个文件。
//!
//! 不加锁：多个进程同时下载同一 URL 时可能重复下载，
//! 但最后一次重命名生效，目标文件始终完整。

use std::io::Write;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::{Client, Url};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// 资源下载错误
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// URL 无法推导出文件名
    #[error("无效的资源 URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    /// 网络请求失败
    #[error("下载 {url} 失败: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
    /// 服务端返回非成功状态码
    #[error("下载 {url} 失败: HTTP {status}")]
    Http { url: String, status: u16 },
    /// 本地文件读写失败
    #[error("写入资源文件 {path} 失败: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// 单次下载的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// URL 为空，无事可做
    Skipped,
    /// 目标文件已存在，未访问网络
    Cached,
    /// 新下载完成
    Downloaded { bytes: u64 },
}

impl FetchOutcome {
    /// 是否没有产生网络请求
    pub fn is_cached(self) -> bool {
        !matches!(self, FetchOutcome::Downloaded { .. })
    }
}

/// 资源存储
///
/// 职责：
/// - 根据 URL 计算确定的目标路径
/// - 目标已存在时直接返回（去重）
/// - 临时文件 + 重命名保证原子写入
#[derive(Clone)]
pub struct AssetStore {
    dir: PathBuf,
    client: Client,
}

impl AssetStore {
    /// 创建资源存储，目录不存在时自动创建
    pub fn new(dir: impl Into<PathBuf>, client: Client) -> Result<Self, AssetError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| AssetError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir, client })
    }

    /// 存储目录
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 计算 URL 对应的目标路径
    pub fn target_path(&self, url: &str) -> Result<PathBuf, AssetError> {
        Ok(self.dir.join(file_name_for(url)?))
    }

    /// 下载资源
    ///
    /// # 参数
    /// - `url`: 资源地址，为空时直接返回 `Skipped`
    ///
    /// # 返回
    /// 目标已存在返回 `Cached`，新下载返回 `Downloaded`；
    /// 网络或 I/O 错误原样返回，由调用方决定如何处理
    pub async fn fetch(&self, url: &str) -> Result<FetchOutcome, AssetError> {
        if url.is_empty() {
            return Ok(FetchOutcome::Skipped);
        }

        let target = self.target_path(url)?;
        if target.exists() {
            debug!("资源已存在: {}", target.display());
            return Ok(FetchOutcome::Cached);
        }

        let bytes = self.download_to(url, &target).await?;
        info!("⬇️ 下载完成: {} ({} 字节)", url, bytes);
        Ok(FetchOutcome::Downloaded { bytes })
    }

    async fn download_to(&self, url: &str, target: &Path) -> Result<u64, AssetError> {
        let io_err = |source: std::io::Error| AssetError::Io {
            path: target.to_path_buf(),
            source,
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".download-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(io_err)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| AssetError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|source| AssetError::Request {
                url: url.to_string(),
                source,
            })?;
            tmp.write_all(&chunk).map_err(io_err)?;
            written += chunk.len() as u64;
        }

        finish(tmp, target).map_err(io_err)?;
        Ok(written)
    }
}

/// 刷盘后重命名到目标路径
fn finish(mut tmp: NamedTempFile, target: &Path) -> std::io::Result<()> {
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// 从 URL 的最后一个路径段推导文件名（忽略查询参数）
pub fn file_name_for(url: &str) -> Result<String, AssetError> {
    let invalid = |reason: &str| AssetError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    let name = parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or_default();

    match name {
        "" => Err(invalid("缺少文件名")),
        "." | ".." => Err(invalid("非法文件名")),
        _ => Ok(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 本地 HTTP 桩：对每个连接返回固定响应，并统计请求次数
    async fn serve(response: Vec<u8>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let response = response.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut read = Vec::new();
                    while !read.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => read.extend_from_slice(&buf[..n]),
                        }
                    }
                    let _ = socket.write_all(&response).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        (format!("http://{}", addr), hits)
    }

    fn ok_response(body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    fn client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    #[test]
    fn test_file_name_ignores_query() {
        assert_eq!(
            file_name_for("https://media.example.com/audio/prons/en/us/mp3/k/kestre01.mp3?x=1").unwrap(),
            "kestre01.mp3"
        );
        assert!(file_name_for("https://media.example.com/audio/").is_err());
        assert!(file_name_for("not a url").is_err());
    }

    #[tokio::test]
    async fn test_empty_url_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().join("audio"), client()).unwrap();
        assert_eq!(store.fetch("").await.unwrap(), FetchOutcome::Skipped);
        assert!(FetchOutcome::Skipped.is_cached());
    }

    #[tokio::test]
    async fn test_second_fetch_is_cached() {
        let (base, hits) = serve(ok_response(b"ID3-audio-bytes")).await;
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().join("audio"), client()).unwrap();
        let url = format!("{}/audio/kestrel.mp3", base);

        let first = store.fetch(&url).await.unwrap();
        assert_eq!(first, FetchOutcome::Downloaded { bytes: 15 });
        let target = store.target_path(&url).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"ID3-audio-bytes");

        let second = store.fetch(&url).await.unwrap();
        assert_eq!(second, FetchOutcome::Cached);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read(&target).unwrap(), b"ID3-audio-bytes");
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_no_target() {
        // 声明 100 字节但只发送 5 字节后断开
        let response =
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort".to_vec();
        let (base, _) = serve(response).await;
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().join("audio"), client()).unwrap();
        let url = format!("{}/audio/broken.mp3", base);

        assert!(store.fetch(&url).await.is_err());
        assert!(!store.target_path(&url).unwrap().exists());
        let leftovers = std::fs::read_dir(store.dir()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_http_error_leaves_no_target() {
        let response =
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec();
        let (base, _) = serve(response).await;
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().join("pic"), client()).unwrap();
        let url = format!("{}/pic/missing.jpg", base);

        match store.fetch(&url).await {
            Err(AssetError::Http { status, .. }) => assert_eq!(status, 404),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!store.target_path(&url).unwrap().exists());
    }
}
