use std::env;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use uuid::Uuid;

/// Receipt files land on local disk under the owner's directory, with a
/// timestamp prefix so repeated uploads of the same filename never collide.
#[derive(Debug)]
pub struct StoredAttachment {
    pub filename: String,
    pub storage_path: String,
    pub size_bytes: i64,
    pub media_type: String,
}

pub fn upload_dir() -> PathBuf {
    PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "static/uploads".to_string()))
}

/// Strip anything that could escape the upload directory or confuse a URL.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('_').is_empty() {
        "attachment".to_string()
    } else {
        cleaned
    }
}

pub async fn save_attachment(
    base: &Path,
    owner: Uuid,
    filename: &str,
    media_type: &str,
    bytes: &[u8],
) -> io::Result<StoredAttachment> {
    let owner_dir = base.join(owner.to_string());
    if !owner_dir.exists() {
        fs::create_dir_all(&owner_dir).await?;
    }

    let safe_name = sanitize_filename(filename);
    let stored_name = format!("{}_{}", Utc::now().timestamp_millis(), safe_name);
    fs::write(owner_dir.join(&stored_name), bytes).await?;

    Ok(StoredAttachment {
        filename: filename.to_string(),
        storage_path: format!("{}/{}", owner, stored_name),
        size_bytes: bytes.len() as i64,
        media_type: media_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_filename("ticket_restaurante.pdf"), "ticket_restaurante.pdf");
        assert_eq!(sanitize_filename("boarding-pass 01.jpg"), "boarding-pass_01.jpg");
    }

    #[test]
    fn sanitize_neutralizes_path_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("a/b\\c.png"), "a_b_c.png");
    }

    #[test]
    fn sanitize_never_returns_an_empty_name() {
        assert_eq!(sanitize_filename(""), "attachment");
        assert_eq!(sanitize_filename("///"), "attachment");
    }

    #[tokio::test]
    async fn save_writes_under_the_owner_directory() {
        let dir = tempfile::tempdir().unwrap();
        let owner = Uuid::new_v4();

        let stored = save_attachment(
            dir.path(),
            owner,
            "factura.pdf",
            "application/pdf",
            b"fake pdf bytes",
        )
        .await
        .unwrap();

        assert!(stored.storage_path.starts_with(&owner.to_string()));
        assert!(stored.storage_path.ends_with("_factura.pdf"));
        assert_eq!(stored.size_bytes, 14);
        assert_eq!(stored.filename, "factura.pdf");

        let on_disk = dir.path().join(&stored.storage_path);
        assert_eq!(std::fs::read(on_disk).unwrap(), b"fake pdf bytes");
    }

    #[tokio::test]
    async fn repeated_uploads_of_the_same_name_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let owner = Uuid::new_v4();

        let first = save_attachment(dir.path(), owner, "recibo.jpg", "image/jpeg", b"one")
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = save_attachment(dir.path(), owner, "recibo.jpg", "image/jpeg", b"two")
            .await
            .unwrap();

        assert_ne!(first.storage_path, second.storage_path);
    }
}
