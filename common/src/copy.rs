//! Resumable byte-stream copy and link recreation
//!
//! # Resuming
//!
//! With `resume` enabled an existing destination is appended to instead of rewritten when it
//! looks like a prefix of the source. The check is a sampling heuristic (see
//! [`is_partial_prefix`]): blocks at regular strides and the tail are compared, bytes in between
//! are never inspected. A destination that was corrupted in one of those gaps is resumed as if
//! it were intact; resume correctness is bounded by the sampling granularity.

use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::Path;

use async_recursion::async_recursion;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::instrument;

use crate::error::{Error, Result};

/// Size of each compared block
pub const VERIFY_BLOCK_LEN: u64 = 512;
/// Distance between the starts of compared blocks
pub const VERIFY_STRIDE: u64 = 1024 * 1024;
pub const DEFAULT_BLOCK_SIZE: usize = 16 * 1024;

#[derive(Debug, Copy, Clone)]
pub struct Settings {
    pub resume: bool,
    /// Remove a destination that cannot be written and retry once
    pub force: bool,
    pub block_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resume: false,
            force: false,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FileSummary {
    /// Bytes actually written to the destination
    pub bytes_written: u64,
    /// Bytes skipped because the destination already held them
    pub bytes_resumed: u64,
}

async fn blocks_equal(
    src: &mut tokio::fs::File,
    dst: &mut tokio::fs::File,
    offset: u64,
    src_buf: &mut [u8],
    dst_buf: &mut [u8],
) -> std::io::Result<bool> {
    src.seek(std::io::SeekFrom::Start(offset)).await?;
    dst.seek(std::io::SeekFrom::Start(offset)).await?;
    src.read_exact(src_buf).await?;
    dst.read_exact(dst_buf).await?;
    Ok(src_buf == dst_buf)
}

/// Checks whether `dst` looks like the beginning of `src`, using [`VERIFY_BLOCK_LEN`] byte
/// blocks every [`VERIFY_STRIDE`] bytes plus the last block of `dst`.
pub async fn is_partial_prefix(src: &Path, dst: &Path) -> std::io::Result<bool> {
    is_partial_prefix_with(src, dst, VERIFY_BLOCK_LEN, VERIFY_STRIDE).await
}

/// Same as [`is_partial_prefix`] with explicit block length and stride.
///
/// Returns false if `dst` is larger than `src` or shorter than a single block.
#[instrument]
pub async fn is_partial_prefix_with(
    src: &Path,
    dst: &Path,
    length: u64,
    stride: u64,
) -> std::io::Result<bool> {
    if length == 0 || stride == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "block length and stride must be positive",
        ));
    }
    let src_size = tokio::fs::metadata(src).await?.len();
    let dst_size = tokio::fs::metadata(dst).await?.len();
    if dst_size > src_size || dst_size < length {
        return Ok(false);
    }
    let mut src_file = tokio::fs::File::open(src).await?;
    let mut dst_file = tokio::fs::File::open(dst).await?;
    let mut src_buf = vec![0; length as usize];
    let mut dst_buf = vec![0; length as usize];
    let last = dst_size - length;
    let mut offset = 0;
    while offset <= last {
        if !blocks_equal(&mut src_file, &mut dst_file, offset, &mut src_buf, &mut dst_buf).await? {
            tracing::debug!("block at offset {} differs", offset);
            return Ok(false);
        }
        offset += stride;
    }
    blocks_equal(&mut src_file, &mut dst_file, last, &mut src_buf, &mut dst_buf).await
}

fn is_same_file(md1: &std::fs::Metadata, md2: &std::fs::Metadata) -> bool {
    md1.dev() == md2.dev() && md1.ino() == md2.ino()
}

enum StreamError {
    Src(std::io::Error),
    Dst(std::io::Error),
}

async fn stream(
    reader: &mut tokio::fs::File,
    dst: &Path,
    resume_from: u64,
    block_size: usize,
    progress: &(dyn Fn(u64) + Send + Sync),
) -> std::result::Result<FileSummary, StreamError> {
    let mut writer = if resume_from > 0 {
        tokio::fs::OpenOptions::new().append(true).open(dst).await
    } else {
        tokio::fs::File::create(dst).await
    }
    .map_err(StreamError::Dst)?;
    let mut summary = FileSummary::default();
    if resume_from > 0 {
        reader
            .seek(std::io::SeekFrom::Start(resume_from))
            .await
            .map_err(StreamError::Src)?;
        progress(resume_from);
        summary.bytes_resumed = resume_from;
    }
    let mut buf = vec![0; block_size.max(1)];
    loop {
        let len = reader.read(&mut buf).await.map_err(StreamError::Src)?;
        if len == 0 {
            break;
        }
        progress(len as u64);
        writer
            .write_all(&buf[..len])
            .await
            .map_err(StreamError::Dst)?;
        summary.bytes_written += len as u64;
    }
    writer.flush().await.map_err(StreamError::Dst)?;
    Ok(summary)
}

/// Copies the content of `src` to `dst`, calling `progress` with the number of bytes handled
/// before each block is written (and once with the skipped length when resuming).
#[instrument(skip(progress))]
#[async_recursion]
pub async fn copy_file(
    src: &Path,
    dst: &Path,
    settings: &Settings,
    progress: &(dyn Fn(u64) + Send + Sync),
) -> Result<FileSummary> {
    let src_metadata = tokio::fs::metadata(src).await.ok();
    let dst_metadata = tokio::fs::metadata(dst).await.ok();
    if let (Some(src_md), Some(dst_md)) = (&src_metadata, &dst_metadata) {
        if is_same_file(src_md, dst_md) {
            return Err(Error::SameFile {
                src: src.to_owned(),
                dst: dst.to_owned(),
            });
        }
    }
    for (path, metadata) in [(src, &src_metadata), (dst, &dst_metadata)] {
        if metadata.as_ref().is_some_and(|md| md.file_type().is_fifo()) {
            return Err(Error::SpecialFile {
                path: path.to_owned(),
            });
        }
    }
    let mut resume_from = 0;
    if settings.resume {
        if let Some(dst_md) = &dst_metadata {
            match is_partial_prefix(src, dst).await {
                Ok(true) => {
                    tracing::debug!("resuming at offset {}", dst_md.len());
                    resume_from = dst_md.len();
                }
                Ok(false) => tracing::debug!("destination is not a prefix of source, rewriting"),
                Err(error) => tracing::debug!("cannot compare with destination: {}", &error),
            }
        }
    }
    let mut reader = tokio::fs::File::open(src)
        .await
        .map_err(|_| Error::permission("open", src))?;
    match stream(&mut reader, dst, resume_from, settings.block_size, progress).await {
        Ok(summary) => Ok(summary),
        Err(StreamError::Src(error)) => Err(Error::io("failed reading", src, error)),
        Err(StreamError::Dst(error)) if settings.force => {
            tracing::info!("cannot write {:?} ({}), removing it and retrying", dst, &error);
            drop(reader);
            tokio::fs::remove_file(dst)
                .await
                .map_err(|_| Error::permission("remove", dst))?;
            let settings = Settings {
                force: false,
                ..*settings
            };
            copy_file(src, dst, &settings, progress).await
        }
        Err(StreamError::Dst(error)) => {
            tracing::debug!("cannot write {:?}: {}", dst, &error);
            Err(Error::permission("create", dst))
        }
    }
}

/// Recreates `src` at `dst`: as a hard link to the same inode, or as a symlink with the same
/// (unresolved) target string.
#[instrument]
pub async fn copy_link(src: &Path, dst: &Path, overwrite: bool, as_hardlink: bool) -> Result<()> {
    match tokio::fs::symlink_metadata(dst).await {
        Ok(dst_metadata) => {
            if dst_metadata.is_dir() {
                return Err(Error::CannotOverwriteDirectory {
                    path: dst.to_owned(),
                });
            }
            // without overwrite only destinations we could write to anyway are replaced
            if !overwrite && !dst_metadata.is_symlink() {
                tokio::fs::OpenOptions::new()
                    .append(true)
                    .open(dst)
                    .await
                    .map_err(|_| Error::permission("create", dst))?;
            }
            tracing::debug!("removing existing {:?}", dst);
            tokio::fs::remove_file(dst)
                .await
                .map_err(|_| Error::permission("remove", dst))?;
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => return Err(Error::io("failed reading metadata of", dst, error)),
    }
    if as_hardlink {
        tokio::fs::hard_link(src, dst)
            .await
            .map_err(|error| Error::io("cannot create hard link", dst, error))?;
    } else {
        let target = tokio::fs::read_link(src)
            .await
            .map_err(|error| Error::io("cannot read symlink", src, error))?;
        tokio::fs::symlink(&target, dst)
            .await
            .map_err(|error| Error::io("cannot create symlink", dst, error))?;
    }
    Ok(())
}

#[cfg(test)]
mod copy_tests {
    use super::*;
    use crate::testutils;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use tracing_test::traced_test;

    struct Counter {
        bytes: AtomicU64,
        calls: AtomicUsize,
    }

    impl Counter {
        fn new() -> Self {
            Self {
                bytes: AtomicU64::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        fn record(&self, len: u64) {
            self.bytes.fetch_add(len, Ordering::Relaxed);
            self.calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn settings(resume: bool, force: bool) -> Settings {
        Settings {
            resume,
            force,
            ..Default::default()
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn prefix_check_is_reflexive() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let dst = tmp_dir.join("dst");
        let data = testutils::write_patterned(&src, 3 * 1024 * 1024 + 777)?;
        for len in [512, 513, 4096, 1024 * 1024, 2 * 1024 * 1024 + 5, data.len()] {
            std::fs::write(&dst, &data[..len])?;
            assert!(is_partial_prefix(&src, &dst).await?, "prefix of length {}", len);
        }
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn prefix_check_rejects_short_and_long_destinations() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let dst = tmp_dir.join("dst");
        let data = testutils::write_patterned(&src, 4096)?;
        std::fs::write(&dst, &data[..511])?;
        assert!(!is_partial_prefix(&src, &dst).await?);
        let mut longer = data.clone();
        longer.push(0);
        std::fs::write(&dst, &longer)?;
        assert!(!is_partial_prefix(&src, &dst).await?);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn prefix_check_rejects_empty_windows() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let dst = tmp_dir.join("dst");
        let data = testutils::write_patterned(&src, 4096)?;
        std::fs::write(&dst, &data[..1024])?;
        for (length, stride) in [(0, 4096), (512, 0), (0, 0)] {
            let error = is_partial_prefix_with(&src, &dst, length, stride)
                .await
                .unwrap_err();
            assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput);
        }
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn prefix_check_only_samples() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let dst = tmp_dir.join("dst");
        let data = testutils::write_patterned(&src, 3 * 4096 + 100)?;
        let flipped = |offset: usize| {
            let mut copy = data.clone();
            copy[offset] ^= 0xff;
            copy
        };
        // inside the first sampled window
        std::fs::write(&dst, flipped(10))?;
        assert!(!is_partial_prefix_with(&src, &dst, 512, 4096).await?);
        // inside a strided window
        std::fs::write(&dst, flipped(2 * 4096 + 511))?;
        assert!(!is_partial_prefix_with(&src, &dst, 512, 4096).await?);
        // inside the tail window
        std::fs::write(&dst, flipped(data.len() - 1))?;
        assert!(!is_partial_prefix_with(&src, &dst, 512, 4096).await?);
        // between two windows: not inspected, so the corrupted file is still accepted
        std::fs::write(&dst, flipped(1000))?;
        assert!(is_partial_prefix_with(&src, &dst, 512, 4096).await?);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn default_stride_misses_middle_corruption() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let dst = tmp_dir.join("dst");
        let data = testutils::write_patterned(&src, 2 * 1024 * 1024 + 4096)?;
        let mut corrupted = data[..2 * 1024 * 1024].to_vec();
        corrupted[VERIFY_STRIDE as usize + 4096] ^= 1;
        std::fs::write(&dst, &corrupted)?;
        assert!(is_partial_prefix(&src, &dst).await?);
        corrupted[VERIFY_STRIDE as usize + 4096] ^= 1;
        corrupted[VERIFY_STRIDE as usize + 100] ^= 1;
        std::fs::write(&dst, &corrupted)?;
        assert!(!is_partial_prefix(&src, &dst).await?);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn check_basic_copy() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let dst = tmp_dir.join("dst");
        let data = testutils::write_patterned(&src, 100_000)?;
        let counter = Counter::new();
        let summary = copy_file(&src, &dst, &settings(false, false), &|len| counter.record(len)).await?;
        assert_eq!(summary.bytes_written, data.len() as u64);
        assert_eq!(summary.bytes_resumed, 0);
        assert_eq!(counter.bytes.load(Ordering::Relaxed), data.len() as u64);
        assert_eq!(std::fs::read(&dst)?, data);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn empty_file_is_created() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let dst = tmp_dir.join("dst");
        std::fs::write(&src, "")?;
        let counter = Counter::new();
        let summary = copy_file(&src, &dst, &settings(false, false), &|len| counter.record(len)).await?;
        assert_eq!(summary, FileSummary::default());
        assert_eq!(counter.calls.load(Ordering::Relaxed), 0);
        assert_eq!(std::fs::metadata(&dst)?.len(), 0);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn resume_appends_missing_tail() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let dst = tmp_dir.join("dst");
        let data = testutils::write_patterned(&src, 50_000)?;
        std::fs::write(&dst, &data[..20_000])?;
        let counter = Counter::new();
        let summary = copy_file(&src, &dst, &settings(true, false), &|len| counter.record(len)).await?;
        assert_eq!(summary.bytes_resumed, 20_000);
        assert_eq!(summary.bytes_written, 30_000);
        // skipped bytes are accounted for in the progress as well
        assert_eq!(counter.bytes.load(Ordering::Relaxed), 50_000);
        assert_eq!(std::fs::read(&dst)?, data);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn resume_of_complete_copy_writes_nothing() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let dst = tmp_dir.join("dst");
        let data = testutils::write_patterned(&src, 70_000)?;
        copy_file(&src, &dst, &settings(false, false), &|_| {}).await?;
        let summary = copy_file(&src, &dst, &settings(true, false), &|_| {}).await?;
        assert_eq!(summary.bytes_written, 0);
        assert_eq!(summary.bytes_resumed, data.len() as u64);
        assert_eq!(std::fs::read(&dst)?, data);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn mismatching_destination_is_rewritten() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let dst = tmp_dir.join("dst");
        let data = testutils::write_patterned(&src, 10_000)?;
        std::fs::write(&dst, vec![0u8; 4_000])?;
        let summary = copy_file(&src, &dst, &settings(true, false), &|_| {}).await?;
        assert_eq!(summary.bytes_resumed, 0);
        assert_eq!(summary.bytes_written, 10_000);
        assert_eq!(std::fs::read(&dst)?, data);
        // without resume even a true prefix is rewritten
        std::fs::write(&dst, &data[..5_000])?;
        let summary = copy_file(&src, &dst, &settings(false, false), &|_| {}).await?;
        assert_eq!(summary.bytes_written, 10_000);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn same_file_is_refused() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let alias = tmp_dir.join("alias");
        std::fs::write(&src, "content")?;
        std::fs::hard_link(&src, &alias)?;
        for dst in [&src, &alias] {
            match copy_file(&src, dst, &settings(false, false), &|_| {}).await {
                Err(Error::SameFile { .. }) => {}
                other => panic!("expected SameFile error, got {:?}", other),
            }
        }
        assert_eq!(std::fs::read_to_string(&src)?, "content");
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn named_pipes_are_refused() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let fifo = tmp_dir.join("fifo");
        let file = tmp_dir.join("file");
        std::fs::write(&file, "content")?;
        let status = tokio::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .await?;
        assert!(status.success());
        match copy_file(&fifo, &tmp_dir.join("out"), &settings(false, false), &|_| {}).await {
            Err(Error::SpecialFile { path }) => assert_eq!(path, fifo),
            other => panic!("expected SpecialFile error, got {:?}", other),
        }
        match copy_file(&file, &fifo, &settings(false, false), &|_| {}).await {
            Err(Error::SpecialFile { path }) => assert_eq!(path, fifo),
            other => panic!("expected SpecialFile error, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_source_is_a_permission_error() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("missing");
        match copy_file(&src, &tmp_dir.join("out"), &settings(false, true), &|_| {}).await {
            Err(Error::Permission { action, path }) => {
                assert_eq!(action, "open");
                assert_eq!(path, src);
            }
            other => panic!("expected Permission error, got {:?}", other),
        }
        assert!(!tmp_dir.join("out").exists());
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn unwritable_destination_without_force() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        std::fs::write(&src, "content")?;
        // a dangling link into a missing directory can never be opened for writing
        let dst = tmp_dir.join("dst");
        std::os::unix::fs::symlink(tmp_dir.join("missing").join("file"), &dst)?;
        match copy_file(&src, &dst, &settings(false, false), &|_| {}).await {
            Err(Error::Permission { action, path }) => {
                assert_eq!(action, "create");
                assert_eq!(path, dst);
            }
            other => panic!("expected Permission error, got {:?}", other),
        }
        assert!(std::fs::symlink_metadata(&dst)?.is_symlink());
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn force_removes_destination_and_retries() -> anyhow::Result<()> {
        // The retry runs with force disabled, so a failure after a successful removal surfaces
        // as Permission("create") instead of looping. That state needs the destination to become
        // unwritable between the removal and the retry, which cannot be arranged without a race
        // (and never when running as root); force_surfaces_failed_removal covers the other exit.
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        std::fs::write(&src, "content")?;
        let dst = tmp_dir.join("dst");
        std::os::unix::fs::symlink(tmp_dir.join("missing").join("file"), &dst)?;
        let summary = copy_file(&src, &dst, &settings(false, true), &|_| {}).await?;
        assert_eq!(summary.bytes_written, 7);
        let metadata = std::fs::symlink_metadata(&dst)?;
        assert!(metadata.is_file());
        assert_eq!(std::fs::read_to_string(&dst)?, "content");
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn force_surfaces_failed_removal() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        std::fs::write(&src, "content")?;
        // directories can be neither opened for writing nor unlinked
        let dst = tmp_dir.join("dir");
        std::fs::create_dir(&dst)?;
        std::fs::write(dst.join("child"), "child")?;
        match copy_file(&src, &dst, &settings(false, true), &|_| {}).await {
            Err(Error::Permission { action, path }) => {
                assert_eq!(action, "remove");
                assert_eq!(path, dst);
            }
            other => panic!("expected Permission error, got {:?}", other),
        }
        match copy_file(&src, &dst, &settings(false, false), &|_| {}).await {
            Err(Error::Permission { action, .. }) => assert_eq!(action, "create"),
            other => panic!("expected Permission error, got {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(dst.join("child"))?, "child");
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn symlink_target_is_copied_verbatim() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir()?;
        let src = tmp_dir.join("foo").join("baz").join("4.txt");
        let dst = tmp_dir.join("link");
        copy_link(&src, &dst, false, false).await?;
        assert_eq!(
            std::fs::read_link(&dst)?,
            std::path::PathBuf::from("../bar/2.txt")
        );
        // existing writable files are replaced
        std::fs::remove_file(&dst)?;
        std::fs::write(&dst, "old")?;
        copy_link(&src, &dst, false, false).await?;
        assert!(std::fs::symlink_metadata(&dst)?.is_symlink());
        // existing links too
        copy_link(&src, &dst, false, false).await?;
        assert!(std::fs::symlink_metadata(&dst)?.is_symlink());
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn hard_link_shares_inode() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let src = tmp_dir.join("src");
        let dst = tmp_dir.join("dst");
        std::fs::write(&src, "shared")?;
        std::fs::write(&dst, "stale")?;
        copy_link(&src, &dst, true, true).await?;
        let src_md = std::fs::metadata(&src)?;
        let dst_md = std::fs::metadata(&dst)?;
        assert!(is_same_file(&src_md, &dst_md));
        assert_eq!(std::fs::read_to_string(&dst)?, "shared");
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn links_never_replace_directories() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir()?;
        let src = tmp_dir.join("foo").join("baz").join("4.txt");
        let dst = tmp_dir.join("foo").join("bar");
        for overwrite in [false, true] {
            match copy_link(&src, &dst, overwrite, false).await {
                Err(Error::CannotOverwriteDirectory { path }) => assert_eq!(path, dst),
                other => panic!("expected CannotOverwriteDirectory error, got {:?}", other),
            }
        }
        assert!(dst.join("1.txt").exists());
        Ok(())
    }
}
