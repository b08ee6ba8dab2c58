use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio_test::{assert_err, assert_ok};

use word_downloader::models::{Dictionary, Entry, WordStream};
use word_downloader::orchestrator::{process_stream, MultiSourceCoordinator, Pacer};
use word_downloader::services::{ExportWriter, LookupError, SourceAdapter};
use word_downloader::workflow::{CacheOrchestrator, LookupState, ResolveError, ResolveOptions, WordCtx};
use word_downloader::MergedRecord;

/// 预设应答
#[derive(Clone)]
enum Reply {
    Hit(&'static str),
    /// 词条不带关键词，只有规范拼写
    Bare(&'static str),
    NotFound,
    Transient,
}

/// 按脚本应答的词典，记录调用次数
#[derive(Clone)]
struct FakeSource {
    dictionary: Dictionary,
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    calls: Arc<AtomicUsize>,
}

impl FakeSource {
    fn new(dictionary: Dictionary) -> Self {
        Self {
            dictionary,
            replies: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn reply(&self, keyword: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(keyword.to_string(), reply);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for FakeSource {
    fn dictionary(&self) -> Dictionary {
        self.dictionary
    }

    async fn lookup(&self, keyword: &str) -> Result<Entry, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().get(keyword).cloned();
        match reply {
            Some(Reply::Hit(word)) => Ok(Entry::new(self.dictionary, word, keyword)),
            Some(Reply::Bare(word)) => Ok(Entry::new(self.dictionary, word, "")),
            Some(Reply::Transient) => Err(LookupError::Http { status: 503 }),
            Some(Reply::NotFound) | None => Err(LookupError::NotFound),
        }
    }
}

fn client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

fn open(source: &FakeSource, root: &Path) -> CacheOrchestrator<FakeSource> {
    let options = ResolveOptions {
        query_online: true,
        download_assets: false,
    };
    let dir = root.join(source.dictionary().id());
    CacheOrchestrator::open(source.clone(), &dir, client(), options).unwrap()
}

#[tokio::test]
async fn test_hit_is_served_from_log_after_restart() {
    let root = tempfile::tempdir().unwrap();
    let source = FakeSource::new(Dictionary::Webster);
    source.reply("Kestrels", Reply::Hit("kestrel"));

    let first = {
        let mut orch = open(&source, root.path());
        assert_ok!(orch.resolve(&WordCtx::new("Kestrels", 1)).await)
    };
    assert_eq!(first.state, LookupState::FreshHit);
    assert!(!first.cached);

    // 新进程：重新打开同一个日志
    let mut orch = open(&source, root.path());
    let again = assert_ok!(orch.resolve(&WordCtx::new("Kestrels", 1)).await);
    assert_eq!(again.state, LookupState::CacheHit);
    assert!(again.cached);
    assert_eq!(again.entry, first.entry);

    let canonical = assert_ok!(orch.resolve(&WordCtx::new("kestrel", 2)).await);
    assert_eq!(canonical.entry, first.entry);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_submitted_keyword_is_remembered_after_restart() {
    let root = tempfile::tempdir().unwrap();
    let source = FakeSource::new(Dictionary::Webster);
    source.reply("Running", Reply::Bare("run"));

    let first = {
        let mut orch = open(&source, root.path());
        let first = assert_ok!(orch.resolve(&WordCtx::new("Running", 1)).await);
        assert_eq!(first.state, LookupState::FreshHit);
        let again = assert_ok!(orch.resolve(&WordCtx::new("Running", 2)).await);
        assert_eq!(again.state, LookupState::CacheHit);
        first
    };

    let mut orch = open(&source, root.path());
    let restarted = assert_ok!(orch.resolve(&WordCtx::new("Running", 1)).await);
    assert_eq!(restarted.state, LookupState::CacheHit);
    assert_eq!(restarted.entry, first.entry);
    assert_eq!(restarted.entry.unwrap().keyword, "Running");

    let canonical = assert_ok!(orch.resolve(&WordCtx::new("run", 2)).await);
    assert_eq!(canonical.state, LookupState::CacheHit);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_not_found_is_remembered_after_restart() {
    let root = tempfile::tempdir().unwrap();
    let source = FakeSource::new(Dictionary::Webster);

    {
        let mut orch = open(&source, root.path());
        let miss = assert_ok!(orch.resolve(&WordCtx::new("qwxz", 1)).await);
        assert_eq!(miss.state, LookupState::FreshMiss);
        assert!(miss.is_not_found());
    }

    let mut orch = open(&source, root.path());
    let again = assert_ok!(orch.resolve(&WordCtx::new("qwxz", 1)).await);
    assert_eq!(again.state, LookupState::TombstoneHit);
    assert!(again.cached);
    assert_eq!(source.calls(), 1);

    let log = std::fs::read_to_string(root.path().join("webster").join("words.txt")).unwrap();
    assert_eq!(log, "__not_found:qwxz\n");
}

#[tokio::test]
async fn test_fresh_hit_plus_tombstone_is_not_free() {
    let root = tempfile::tempdir().unwrap();
    let s1 = FakeSource::new(Dictionary::Collins);
    let s2 = FakeSource::new(Dictionary::Webster);
    s1.reply("w", Reply::Hit("w"));

    // S2 先确认不存在，留下墓碑
    {
        let mut orch = open(&s2, root.path());
        assert_ok!(orch.resolve(&WordCtx::new("w", 1)).await);
    }

    // 注册顺序与优先级相反，协调器仍按优先级处理
    let mut coordinator = MultiSourceCoordinator::new(vec![open(&s2, root.path()), open(&s1, root.path())]);
    assert_eq!(
        coordinator.dictionaries(),
        vec![Dictionary::Collins, Dictionary::Webster]
    );

    let outcome = assert_ok!(coordinator.process_word(&WordCtx::new("w", 1)).await);
    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].dictionary, Dictionary::Collins);
    assert_eq!(outcome.entries[0].word, "w");
    assert_eq!(outcome.reports[0].state, Some(LookupState::FreshHit));
    assert_eq!(outcome.reports[1].state, Some(LookupState::TombstoneHit));
    assert!(!outcome.free);
}

#[tokio::test]
async fn test_all_cached_word_is_free() {
    let root = tempfile::tempdir().unwrap();
    let s1 = FakeSource::new(Dictionary::Collins);
    let s2 = FakeSource::new(Dictionary::BingDict);
    s1.reply("w2", Reply::Hit("w2"));
    s2.reply("w2", Reply::Hit("w2"));

    let mut coordinator = MultiSourceCoordinator::new(vec![open(&s1, root.path()), open(&s2, root.path())]);
    let first = assert_ok!(coordinator.process_word(&WordCtx::new("w2", 1)).await);
    assert!(!first.free);

    let second = assert_ok!(coordinator.process_word(&WordCtx::new("w2", 2)).await);
    assert!(second.free);
    assert_eq!(second.entries.len(), 2);
    assert!(second.reports.iter().all(|r| r.state == Some(LookupState::CacheHit)));
    assert_eq!(s1.calls() + s2.calls(), 2);
}

#[tokio::test]
async fn test_transient_error_is_retried_next_run() {
    let root = tempfile::tempdir().unwrap();
    let s1 = FakeSource::new(Dictionary::Collins);
    let s2 = FakeSource::new(Dictionary::Webster);
    s1.reply("w3", Reply::Transient);
    s2.reply("w3", Reply::Hit("w3"));

    {
        let mut coordinator =
            MultiSourceCoordinator::new(vec![open(&s1, root.path()), open(&s2, root.path())]);
        let outcome = assert_ok!(coordinator.process_word(&WordCtx::new("w3", 1)).await);
        // 一个词典失败不影响另一个
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.reports[0].state, None);
        assert!(!outcome.free);
    }
    let log = std::fs::read_to_string(root.path().join("collins").join("words.txt")).unwrap();
    assert!(log.is_empty());

    // 下一次运行：暂时性错误已恢复
    s1.reply("w3", Reply::Hit("w3"));
    let mut orch = open(&s1, root.path());
    let res = assert_ok!(orch.resolve(&WordCtx::new("w3", 1)).await);
    assert_eq!(res.state, LookupState::FreshHit);
    assert_eq!(s1.calls(), 2);
}

#[tokio::test]
async fn test_transient_error_surfaces_from_resolve() {
    let root = tempfile::tempdir().unwrap();
    let source = FakeSource::new(Dictionary::Dictcn);
    source.reply("owl", Reply::Transient);

    let mut orch = open(&source, root.path());
    let err = assert_err!(orch.resolve(&WordCtx::new("owl", 1)).await);
    assert!(matches!(err, ResolveError::Transient(LookupError::Http { status: 503 })));
}

#[tokio::test]
async fn test_corrupt_log_aborts_open() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("webster");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("words.txt"), "__not_found:owl\n{\"dictionary\":\"webster\"\n").unwrap();

    let source = FakeSource::new(Dictionary::Webster);
    let result = CacheOrchestrator::open(source, &dir, client(), ResolveOptions::default());
    let err = result.err().unwrap();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("第 2 行"));
}

#[tokio::test]
async fn test_stream_exports_merged_records() {
    let root = tempfile::tempdir().unwrap();
    let s1 = FakeSource::new(Dictionary::Collins);
    let s2 = FakeSource::new(Dictionary::Webster);
    s1.reply("owl", Reply::Hit("owl"));
    s2.reply("owl", Reply::Hit("owl"));

    let mut coordinator = MultiSourceCoordinator::new(vec![open(&s2, root.path()), open(&s1, root.path())]);
    let mut words = WordStream::from_reader(&b"owl\n\n  qwxz \nowl\n"[..]);
    let pacer = Pacer::new(Duration::from_millis(10));
    let export_path = root.path().join("export.jsonl");
    let mut export = ExportWriter::open(&export_path).await.unwrap();
    let log_path = root.path().join("run.log");
    let log_path = log_path.to_str().unwrap();

    let stats = process_stream(&mut coordinator, &mut words, &pacer, Some(&mut export), log_path)
        .await
        .unwrap();

    assert_eq!(stats.words, 3);
    assert_eq!(stats.words_with_entries, 2);
    assert_eq!(stats.words_without_entries, 1);
    assert_eq!(stats.fresh_lookups, 4);
    assert_eq!(stats.cache_hits, 2);
    assert_eq!(stats.throttled_words, 1);

    let exported = std::fs::read_to_string(&export_path).unwrap();
    let records: Vec<MergedRecord> = exported
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sources, vec![Dictionary::Collins, Dictionary::Webster]);
    assert_eq!(records[0], records[1]);

    let run_log = std::fs::read_to_string(log_path).unwrap();
    assert!(run_log.contains("qwxz\t0\t"));
    assert!(run_log.contains("owl\t2\tcollins,webster"));
}
