//! Hosts-file domain blocking
//!
//! Entries are appended under a marker comment; existing content is never
//! rewritten. Presence is decided line-wise, so commented-out entries do not
//! count as blocks.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use warden_host_api::{BlockOutcome, HostError, HostResult};

/// Address blocked domains are pointed at
const BLOCK_TARGET: &str = "127.0.0.1";

/// Comment line preceding the entries warden appends
const BLOCK_MARKER: &str = "# warden domain block";

/// Map each domain to loopback in `path`, appending only what is missing.
pub fn ensure_blocked(path: &Path, domains: &[&str]) -> HostResult<BlockOutcome> {
    let content = std::fs::read_to_string(path).map_err(|e| classify(path, e))?;

    let mut outcome = BlockOutcome {
        added: 0,
        already_present: 0,
    };
    let mut additions = Vec::new();
    for domain in domains {
        if is_blocked(&content, domain) {
            outcome.already_present += 1;
        } else {
            additions.push(format!("{} {}", BLOCK_TARGET, domain));
            outcome.added += 1;
        }
    }

    if additions.is_empty() {
        return Ok(outcome);
    }

    let mut tail = String::new();
    if !content.is_empty() && !content.ends_with('\n') {
        tail.push('\n');
    }
    if !content.contains(BLOCK_MARKER) {
        tail.push_str(BLOCK_MARKER);
        tail.push('\n');
    }
    for entry in &additions {
        tail.push_str(entry);
        tail.push('\n');
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| classify(path, e))?;
    file.write_all(tail.as_bytes())
        .map_err(|e| classify(path, e))?;

    Ok(outcome)
}

/// Whether a non-comment line already maps the block target to `domain`
fn is_blocked(content: &str, domain: &str) -> bool {
    content.lines().any(|line| {
        let line = line.trim();
        if line.starts_with('#') {
            return false;
        }
        let mut fields = line.split_whitespace();
        fields.next() == Some(BLOCK_TARGET) && fields.any(|name| name == domain)
    })
}

fn classify(path: &Path, err: std::io::Error) -> HostError {
    if err.kind() == ErrorKind::PermissionDenied {
        HostError::PermissionDenied(format!("{}: {}", path.display(), err))
    } else {
        HostError::Io(err)
    }
}
