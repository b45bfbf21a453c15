use tracing::instrument;

#[derive(Debug)]
pub struct TlsCounter {
    // mutex is used primarily from one thread, so it's not a bottleneck
    count: thread_local::ThreadLocal<std::sync::Mutex<u64>>,
}

impl TlsCounter {
    pub fn new() -> Self {
        Self {
            count: thread_local::ThreadLocal::new(),
        }
    }

    pub fn add(&self, value: u64) {
        let mutex = self.count.get_or(|| std::sync::Mutex::new(0));
        let mut guard = mutex.lock().unwrap();
        *guard += value;
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn get(&self) -> u64 {
        self.count.iter().fold(0, |x, y| x + *y.lock().unwrap())
    }
}

impl Default for TlsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Run-wide counters, updated concurrently by every pipeline role.
#[derive(Debug)]
pub struct Progress {
    pub bytes_copied: TlsCounter,
    pub bytes_resumed: TlsCounter,
    pub files_copied: TlsCounter,
    pub directories_created: TlsCounter,
    pub directories_unchanged: TlsCounter,
    pub symlinks_created: TlsCounter,
    pub hard_links_created: TlsCounter,
    pub overwrites_declined: TlsCounter,
    pub errors: TlsCounter,
    start_time: std::time::Instant,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            bytes_copied: Default::default(),
            bytes_resumed: Default::default(),
            files_copied: Default::default(),
            directories_created: Default::default(),
            directories_unchanged: Default::default(),
            symlinks_created: Default::default(),
            hard_links_created: Default::default(),
            overwrites_declined: Default::default(),
            errors: Default::default(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn get_duration(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    #[instrument(skip(self))]
    pub fn summary(&self) -> Summary {
        Summary {
            bytes_copied: self.bytes_copied.get(),
            bytes_resumed: self.bytes_resumed.get(),
            files_copied: self.files_copied.get(),
            directories_created: self.directories_created.get(),
            directories_unchanged: self.directories_unchanged.get(),
            symlinks_created: self.symlinks_created.get(),
            hard_links_created: self.hard_links_created.get(),
            overwrites_declined: self.overwrites_declined.get(),
            errors: self.errors.get(),
            duration: self.get_duration(),
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub bytes_copied: u64,
    pub bytes_resumed: u64,
    pub files_copied: u64,
    pub directories_created: u64,
    pub directories_unchanged: u64,
    pub symlinks_created: u64,
    pub hard_links_created: u64,
    pub overwrites_declined: u64,
    pub errors: u64,
    pub duration: std::time::Duration,
}

impl std::ops::Add for Summary {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            bytes_copied: self.bytes_copied + other.bytes_copied,
            bytes_resumed: self.bytes_resumed + other.bytes_resumed,
            files_copied: self.files_copied + other.files_copied,
            directories_created: self.directories_created + other.directories_created,
            directories_unchanged: self.directories_unchanged + other.directories_unchanged,
            symlinks_created: self.symlinks_created + other.symlinks_created,
            hard_links_created: self.hard_links_created + other.hard_links_created,
            overwrites_declined: self.overwrites_declined + other.overwrites_declined,
            errors: self.errors + other.errors,
            duration: self.duration.max(other.duration),
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let secs = self.duration.as_secs_f64();
        let rate = if secs > 0.0 {
            (self.bytes_copied as f64 / secs) as u64
        } else {
            0
        };
        write!(
            f,
            "bytes copied: {}\n\
            bytes resumed: {}\n\
            average rate: {}/s\n\
            files copied: {}\n\
            directories created: {}\n\
            directories unchanged: {}\n\
            symlinks created: {}\n\
            hard links created: {}\n\
            overwrites declined: {}\n\
            errors: {}",
            bytesize::ByteSize(self.bytes_copied),
            bytesize::ByteSize(self.bytes_resumed),
            bytesize::ByteSize(rate),
            self.files_copied,
            self.directories_created,
            self.directories_unchanged,
            self.symlinks_created,
            self.hard_links_created,
            self.overwrites_declined,
            self.errors,
        )
    }
}
