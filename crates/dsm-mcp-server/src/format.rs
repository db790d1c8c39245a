//! Plain-text rendering of File Station payloads for tool results.

use std::collections::HashSet;
use std::fmt::Write;

use dsm_client::{FileEntry, SearchOutcome, ServerInfo, ShareLinkPage};

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Binary-unit size with at most two decimals: `1073741824` is `"1 GB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    // 1023.999 KB rounds to 1024.00, which reads better as 1 MB.
    if (value * 100.0).round() / 100.0 >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{:.2}", value);
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", rendered, UNITS[unit])
}

fn entry_line(out: &mut String, label: &str, entry: &FileEntry) {
    if entry.is_dir {
        let _ = writeln!(out, "[DIR] {}", label);
    } else {
        match entry.size() {
            Some(size) => {
                let _ = writeln!(out, "[FILE] {} ({})", label, format_bytes(size));
            }
            None => {
                let _ = writeln!(out, "[FILE] {}", label);
            }
        }
    }
}

fn finish(mut out: String) -> String {
    while out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Entries in the order the NAS returned them.
pub fn render_listing(path: &str, entries: &[FileEntry]) -> String {
    if entries.is_empty() {
        return format!("{} is empty", path);
    }
    let mut out = format!("Contents of {} ({} items):\n", path, entries.len());
    for entry in entries {
        entry_line(&mut out, &entry.name, entry);
    }
    finish(out)
}

pub fn render_shares(shares: &[FileEntry]) -> String {
    if shares.is_empty() {
        return "No shared folders available".to_string();
    }
    let mut out = format!("Shared folders ({}):\n", shares.len());
    for share in shares {
        let _ = writeln!(out, "[DIR] {}", share.path);
    }
    finish(out)
}

pub fn render_search(folder_path: &str, pattern: &str, outcome: &SearchOutcome) -> String {
    if outcome.matches.is_empty() {
        return format!("No matches for '{}' in {}", pattern, folder_path);
    }

    let mut out = format!(
        "Found {} matches for '{}' in {}",
        outcome.total.max(outcome.matches.len() as u64),
        pattern,
        folder_path
    );
    if outcome.total > outcome.matches.len() as u64 {
        let _ = write!(out, " (showing first {})", outcome.matches.len());
    }
    out.push_str(":\n");

    for found in &outcome.matches {
        if found.is_dir {
            let _ = writeln!(out, "[DIR] {}", found.path);
        } else {
            match found.size {
                Some(size) => {
                    let _ = writeln!(out, "[FILE] {} ({})", found.path, format_bytes(size));
                }
                None => {
                    let _ = writeln!(out, "[FILE] {}", found.path);
                }
            }
        }
    }
    finish(out)
}

pub fn render_share_links(page: &ShareLinkPage) -> String {
    if page.links.is_empty() {
        return "No share links".to_string();
    }
    let mut out = format!("Share links ({} of {}):\n", page.links.len(), page.total);
    for link in &page.links {
        let _ = write!(out, "{} -> {}", link.path, link.url);
        if link.has_password {
            out.push_str(" [password]");
        }
        if let Some(date) = link.date_expired.as_deref().filter(|d| !d.is_empty()) {
            let _ = write!(out, " (expires {})", date);
        }
        if let Some(status) = link.status.as_deref() {
            let _ = write!(out, " [{}]", status);
        }
        out.push('\n');
    }
    finish(out)
}

pub fn render_server_info(info: &ServerInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Hostname: {}", info.hostname);
    let _ = writeln!(out, "Administrator: {}", yes_no(info.is_manager));
    let _ = writeln!(out, "Sharing supported: {}", yes_no(info.support_sharing));
    let protocols = info.virtual_protocols();
    if !protocols.is_empty() {
        let _ = writeln!(out, "Virtual protocols: {}", protocols.join(", "));
    }
    if let Some(codepage) = info.system_codepage.as_deref() {
        let _ = writeln!(out, "Codepage: {}", codepage);
    }
    finish(out)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Per-share volume usage followed by totals.
///
/// Shares on the same volume report the same status, so each volume (taken
/// from the share's real path) is counted once in the totals. A share without
/// a real path counts as its own volume.
pub fn render_quota(shares: &[FileEntry]) -> String {
    let mut out = String::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let (mut total, mut free) = (0u64, 0u64);

    for share in shares {
        let Some(status) = share.volume_status() else {
            continue;
        };
        let _ = writeln!(
            out,
            "{}: {} used of {} ({} free){}",
            share.name,
            format_bytes(status.used()),
            format_bytes(status.totalspace),
            format_bytes(status.freespace),
            if status.readonly { " [read-only]" } else { "" }
        );
        if seen.insert(share.volume().unwrap_or(share.path.as_str())) {
            total += status.totalspace;
            free += status.freespace;
        }
    }

    if seen.is_empty() {
        return "No volume information available".to_string();
    }

    let _ = writeln!(
        out,
        "Total: {} used of {} ({} free)",
        format_bytes(total.saturating_sub(free)),
        format_bytes(total),
        format_bytes(free)
    );
    finish(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsm_client::{SearchMatch, ShareLink};
    use serde_json::json;

    fn entry(value: serde_json::Value) -> FileEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn bytes_use_binary_units() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1073741824), "1 GB");
        assert_eq!(format_bytes(1288490189), "1.2 GB");
        assert_eq!(format_bytes(5 * 1024u64.pow(5)), "5120 TB");
    }

    #[test]
    fn bytes_just_below_a_unit_round_up_to_it() {
        assert_eq!(format_bytes(1048575), "1 MB");
        assert_eq!(format_bytes(1073741823), "1 GB");
        assert_eq!(format_bytes(1023), "1023 Bytes");
        assert_eq!(format_bytes(1048064), "1023.5 KB");
    }

    #[test]
    fn server_info_joins_protocol_list() {
        let info: ServerInfo = serde_json::from_value(json!({
            "hostname": "diskstation",
            "is_manager": true,
            "support_sharing": true,
            "support_virtual_protocol": ["cifs", "nfs", "iso"]
        }))
        .unwrap();
        assert_eq!(
            render_server_info(&info),
            "Hostname: diskstation\nAdministrator: yes\nSharing supported: yes\nVirtual protocols: cifs, nfs, iso"
        );
    }

    #[test]
    fn listing_keeps_remote_order() {
        let entries = vec![
            entry(json!({"path": "/photos/2024", "name": "2024", "isdir": true})),
            entry(json!({
                "path": "/photos/a.jpg",
                "name": "a.jpg",
                "isdir": false,
                "additional": {"size": 2048}
            })),
        ];
        assert_eq!(
            render_listing("/photos", &entries),
            "Contents of /photos (2 items):\n[DIR] 2024\n[FILE] a.jpg (2 KB)"
        );
        assert_eq!(render_listing("/empty", &[]), "/empty is empty");
    }

    #[test]
    fn search_mentions_truncation() {
        let outcome = SearchOutcome {
            task_id: "t".to_string(),
            matches: vec![SearchMatch {
                path: "/photos/beach.jpg".to_string(),
                name: "beach.jpg".to_string(),
                is_dir: false,
                size: Some(1048576),
            }],
            total: 3,
            polls: 1,
        };
        assert_eq!(
            render_search("/photos", "beach", &outcome),
            "Found 3 matches for 'beach' in /photos (showing first 1):\n[FILE] /photos/beach.jpg (1 MB)"
        );
    }

    #[test]
    fn share_links_show_expiry_and_password() {
        let page = ShareLinkPage {
            links: vec![ShareLink {
                id: "abc".to_string(),
                url: "https://gofile.me/abc".to_string(),
                path: "/photos/a.jpg".to_string(),
                name: None,
                is_folder: false,
                has_password: true,
                date_expired: Some("2030-01-01".to_string()),
                status: None,
            }],
            total: 1,
            offset: 0,
        };
        assert_eq!(
            render_share_links(&page),
            "Share links (1 of 1):\n/photos/a.jpg -> https://gofile.me/abc [password] (expires 2030-01-01)"
        );
    }

    #[test]
    fn quota_counts_each_volume_once() {
        let volume = json!({"freespace": 1073741824u64, "totalspace": 4294967296u64, "readonly": false});
        let shares = vec![
            entry(json!({"path": "/photos", "name": "photos", "isdir": true,
                         "additional": {"real_path": "/volume1/photos", "volume_status": volume}})),
            entry(json!({"path": "/homes", "name": "homes", "isdir": true,
                         "additional": {"real_path": "/volume1/homes", "volume_status": volume}})),
        ];
        let text = render_quota(&shares);
        assert!(text.starts_with("photos: 3 GB used of 4 GB (1 GB free)\n"));
        assert!(text.ends_with("Total: 3 GB used of 4 GB (1 GB free)"));
        assert_eq!(render_quota(&[]), "No volume information available");
    }

    #[test]
    fn quota_keeps_identical_volumes_apart() {
        let volume = json!({"freespace": 1073741824u64, "totalspace": 4294967296u64, "readonly": false});
        let shares = vec![
            entry(json!({"path": "/photos", "name": "photos", "isdir": true,
                         "additional": {"real_path": "/volume1/photos", "volume_status": volume}})),
            entry(json!({"path": "/backup", "name": "backup", "isdir": true,
                         "additional": {"real_path": "/volume2/backup", "volume_status": volume}})),
        ];
        assert!(render_quota(&shares).ends_with("Total: 6 GB used of 8 GB (2 GB free)"));
    }
}
