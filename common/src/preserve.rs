use anyhow::{Context, Result};
use std::os::unix::fs::MetadataExt;
use std::os::unix::prelude::PermissionsExt;
use tracing::{event, instrument, Level};

#[derive(Copy, Clone, Debug, Default)]
pub struct UserAndTimeSettings {
    pub uid: bool,
    pub gid: bool,
    pub time: bool,
}

impl UserAndTimeSettings {
    pub fn any(&self) -> bool {
        self.uid || self.gid || self.time
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct FileSettings {
    pub user_and_time: UserAndTimeSettings,
    pub mode_mask: u32,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct DirSettings {
    pub user_and_time: UserAndTimeSettings,
    pub mode_mask: u32,
}

/// Attributes copied from source to destination. Links never get any.
#[derive(Copy, Clone, Debug, Default)]
pub struct Settings {
    pub file: FileSettings,
    pub dir: DirSettings,
}

impl Settings {
    /// True if applying these settings would touch the destination at all
    pub fn any(&self) -> bool {
        self.file.mode_mask != 0
            || self.dir.mode_mask != 0
            || self.file.user_and_time.any()
            || self.dir.user_and_time.any()
    }
}

#[instrument]
async fn set_owner_and_time(
    settings: &UserAndTimeSettings,
    path: &std::path::Path,
    metadata: &std::fs::Metadata,
) -> Result<()> {
    if !settings.any() {
        return Ok(());
    }
    let settings = settings.to_owned();
    let dst = path.to_owned();
    let metadata = metadata.to_owned();
    tokio::task::spawn_blocking(move || -> Result<()> {
        // set timestamps first - those are unlikely to fail
        if settings.time {
            event!(Level::DEBUG, "setting timestamps");
            let atime = filetime::FileTime::from_last_access_time(&metadata);
            let mtime = filetime::FileTime::from_last_modification_time(&metadata);
            filetime::set_file_times(&dst, atime, mtime)
                .with_context(|| format!("failed setting timestamps for {:?}", &dst))?;
        }
        if settings.uid || settings.gid {
            // set user and group last, if those fail we at least have the timestamps set
            event!(Level::DEBUG, "setting uid and gid");
            let uid = settings.uid.then(|| metadata.uid());
            let gid = settings.gid.then(|| metadata.gid());
            std::os::unix::fs::chown(&dst, uid, gid).with_context(|| {
                format!(
                    "cannot set {:?} owner to {:?} and/or group id to {:?}",
                    &dst, &uid, &gid
                )
            })?;
        }
        Ok(())
    })
    .await?
}

fn masked_permissions(metadata: &std::fs::Metadata, mode_mask: u32) -> std::fs::Permissions {
    if mode_mask == 0o7777 {
        metadata.permissions()
    } else {
        std::fs::Permissions::from_mode(metadata.permissions().mode() & mode_mask)
    }
}

/// Copies the configured attributes of a regular file (or a hard link to one) onto `path`.
pub async fn set_file_metadata(
    settings: &Settings,
    metadata: &std::fs::Metadata,
    path: &std::path::Path,
) -> Result<()> {
    if settings.file.mode_mask != 0 {
        let permissions = masked_permissions(metadata, settings.file.mode_mask);
        tokio::fs::set_permissions(path, permissions.clone())
            .await
            .with_context(|| format!("cannot set {:?} permissions to {:?}", &path, &permissions))?;
    }
    set_owner_and_time(&settings.file.user_and_time, path, metadata).await?;
    Ok(())
}

pub async fn set_dir_metadata(
    settings: &Settings,
    metadata: &std::fs::Metadata,
    path: &std::path::Path,
) -> Result<()> {
    if settings.dir.mode_mask != 0 {
        let permissions = masked_permissions(metadata, settings.dir.mode_mask);
        tokio::fs::set_permissions(path, permissions.clone())
            .await
            .with_context(|| format!("cannot set {:?} permissions to {:?}", &path, &permissions))?;
    }
    set_owner_and_time(&settings.dir.user_and_time, path, metadata).await?;
    Ok(())
}

/// Mode bits and timestamps
pub fn preserve_attributes() -> Settings {
    let user_and_time = UserAndTimeSettings {
        uid: false,
        gid: false,
        time: true,
    };
    Settings {
        file: FileSettings {
            user_and_time,
            mode_mask: 0o7777,
        },
        dir: DirSettings {
            user_and_time,
            mode_mask: 0o7777,
        },
    }
}

/// Mode bits, timestamps and ownership
pub fn preserve_all() -> Settings {
    let user_and_time = UserAndTimeSettings {
        uid: true,
        gid: true,
        time: true,
    };
    Settings {
        file: FileSettings {
            user_and_time,
            mode_mask: 0o7777,
        },
        dir: DirSettings {
            user_and_time,
            mode_mask: 0o7777,
        },
    }
}

/// Nothing is copied, new entries get the process defaults
pub fn preserve_none() -> Settings {
    Settings::default()
}
