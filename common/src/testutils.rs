use std::path::{Path, PathBuf};

pub fn create_temp_dir() -> anyhow::Result<PathBuf> {
    let mut idx = 0;
    loop {
        let tmp_dir = std::env::temp_dir().join(format!("rcopy_test{}", &idx));
        if let Err(error) = std::fs::create_dir(&tmp_dir) {
            match error.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    idx += 1;
                }
                _ => return Err(error.into()),
            }
        } else {
            return Ok(tmp_dir);
        }
    }
}

pub fn setup_test_dir() -> anyhow::Result<PathBuf> {
    let tmp_dir = create_temp_dir()?;
    // foo
    // |- 0.txt
    // |- bar
    //    |- 1.txt
    //    |- 2.txt
    // |- baz
    //    |- 3.txt
    //    |- 4.txt -> ../bar/2.txt
    //    |- 5.txt (hard link to bar/1.txt)
    let foo_path = tmp_dir.join("foo");
    std::fs::create_dir(&foo_path)?;
    std::fs::write(foo_path.join("0.txt"), "0")?;
    let bar_path = foo_path.join("bar");
    std::fs::create_dir(&bar_path)?;
    std::fs::write(bar_path.join("1.txt"), "1")?;
    std::fs::write(bar_path.join("2.txt"), "2")?;
    let baz_path = foo_path.join("baz");
    std::fs::create_dir(&baz_path)?;
    std::fs::write(baz_path.join("3.txt"), "3")?;
    std::os::unix::fs::symlink("../bar/2.txt", baz_path.join("4.txt"))?;
    std::fs::hard_link(bar_path.join("1.txt"), baz_path.join("5.txt"))?;
    Ok(tmp_dir)
}

/// Deterministic, non-repeating content so that misplaced blocks are detected.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| ((i * 7 + i / 251) % 256) as u8)
        .collect()
}

pub fn write_patterned(path: &Path, len: usize) -> anyhow::Result<Vec<u8>> {
    let data = patterned_bytes(len);
    std::fs::write(path, &data)?;
    Ok(data)
}
