//! Loading `.eml` and `.mbox` files as text.

use std::path::Path;

use crate::error::Result;
use crate::model::message::MailboxText;
use crate::store::ArchiveFs;

/// Read a message or mailbox file and decode it.
///
/// Decoding never fails: bytes that are not UTF-8 are read as Windows-1252.
pub fn read_mail_file(fs: &dyn ArchiveFs, path: &Path) -> Result<MailboxText> {
    let data = fs.read_all(path)?;
    Ok(MailboxText::decode(&data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::Message;
    use crate::store::LocalFs;

    #[test]
    fn test_read_mail_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.eml");
        std::fs::write(&path, b"Date: 31 Dec 1999 23:59:00 +0000\nSubject: Caf\xe9\n\nhi\n").unwrap();

        let text = read_mail_file(&LocalFs::new(), &path).unwrap();
        let message = Message::whole(text.as_str());
        assert_eq!(message.subject().as_deref(), Some("Café"));
        assert!(message.date().is_ok());
    }

    #[test]
    fn test_read_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_mail_file(&LocalFs::new(), &dir.path().join("missing.eml"));
        assert!(result.is_err());
    }
}
