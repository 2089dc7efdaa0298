//! Server listing with pagination
//!
//! CLI command to print the cached service catalog.

use crate::cluster::maps;
use crate::servers::catalog::{ServerDefinition, ServiceCatalog};

const PAGE_SIZE: usize = 5;

/// Clamp a 1-based page number to the available pages.
fn page_bounds(page: i64, total_count: usize) -> (usize, usize, usize) {
    let total_pages = total_count.div_ceil(PAGE_SIZE).max(1);
    let page = (page.max(1) as usize).min(total_pages);
    let start_idx = (page - 1) * PAGE_SIZE;
    let end_idx = std::cmp::min(start_idx + PAGE_SIZE, total_count);
    (page, start_idx, end_idx)
}

pub fn list_servers(catalog: &ServiceCatalog, page: i64) {
    let servers = match catalog.list() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read service catalog: {}", e);
            return;
        }
    };

    let total_count = servers.len();
    if total_count == 0 {
        println!("╔═══════════════════════════════════════════════════════════════════╗");
        println!("║                          No Servers Found                         ║");
        println!("║          run `clusterd --refresh` to read the compose project     ║");
        println!("╚═══════════════════════════════════════════════════════════════════╝");
        return;
    }

    let total_pages = total_count.div_ceil(PAGE_SIZE);
    let (page, start_idx, end_idx) = page_bounds(page, total_count);

    println!();
    println!("╔═══════════════════════════════════════════════════════════════════════════╗");
    println!("║                                SERVER LIST                                ║");
    println!("╠═══════════════════════════════════════════════════════════════════════════╣");
    println!(
        "║  Page {}/{} | Showing {}-{} of {} servers",
        page,
        total_pages,
        start_idx + 1,
        end_idx,
        total_count
    );
    println!("╠═══════════════════════════════════════════════════════════════════════════╣");

    for (i, server) in servers[start_idx..end_idx].iter().enumerate() {
        print_server(start_idx + i + 1, server);
        if start_idx + i + 1 < end_idx {
            println!("║  ───────────────────────────────────────────────────────────────────────  ║");
        }
    }

    println!("╠═══════════════════════════════════════════════════════════════════════════╣");
    println!("║  Navigation: clusterd --servers <page>");
    if page > 1 {
        println!("║    Previous: clusterd --servers {}", page - 1);
    }
    if page < total_pages {
        println!("║    Next:     clusterd --servers {}", page + 1);
    }
    println!("╚═══════════════════════════════════════════════════════════════════════════╝");
    println!();
}

fn print_server(idx: usize, server: &ServerDefinition) {
    let port = server
        .port
        .map(|p| p.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    println!("║  [{:>3}] Service:   {}", idx, truncate(&server.id, 40));
    println!("║        Container: {}", truncate(&server.container_name, 40));
    println!("║        Session:   {}", truncate(&server.session_name, 40));
    println!("║        Map:       {} ({})", maps::display_name(&server.map_raw), server.map_raw);
    println!("║        Port:      {}", port);
}

/// Truncate a string to a maximum number of characters
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_clamped() {
        assert_eq!(page_bounds(0, 12), (1, 0, 5));
        assert_eq!(page_bounds(3, 12), (3, 10, 12));
        assert_eq!(page_bounds(9, 12), (3, 10, 12));
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ラグナロクサーバー", 6), "ラグナ...");
    }
}
