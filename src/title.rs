//! Best-effort titles for query tabs and chat sessions
//!
//! Both heuristics are pure: the same text always yields the same title.

use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_CHAT_TITLE: &str = "New Chat";
pub const DEFAULT_QUERY_TITLE: &str = "New Query";

const TRUNCATE_AT: usize = 30;

/// (any of these substrings, title), checked in order against lowercase text
const CHAT_RULES: &[(&[&str], &str)] = &[
    (&["select", "query", "fetch"], "Data Query Chat"),
    (&["insert", "update", "delete"], "Data Modification Chat"),
    (&["create table", "schema", "migration"], "Schema Design Chat"),
    (&["optimize", "slow", "index"], "Query Optimization Chat"),
    (&["explain", "what does"], "Query Explanation Chat"),
    (&["error", "fix", "fail"], "Troubleshooting Chat"),
    (&["chart", "plot", "visual"], "Visualization Chat"),
];

fn sql_statement_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^\s*(select|update|insert|delete)\b(.*)$").expect("static regex")
    })
}

fn target_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:from|into)\s+([`"\[]?[\w.]+[`"\]]?)"#).expect("static regex")
    })
}

fn first_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*([`"\[]?[\w.]+[`"\]]?)"#).expect("static regex"))
}

/// Title for a query tab
///
/// 1. SQL statements: verb + target table, `SELECT * FROM sales` -> `Select Sales`
/// 2. Keyword families: `show inventory total value` -> `Inventory Total Value`
/// 3. First line, truncated
pub fn query_title(query: &str) -> String {
    if let Some(title) = structural_title(query) {
        return title;
    }
    if let Some(title) = keyword_title(&query.to_lowercase()) {
        return title.to_string();
    }
    truncated(query.trim().lines().next().unwrap_or_default())
}

/// Title for a chat session, derived from its first message
pub fn chat_title(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return DEFAULT_CHAT_TITLE.to_string();
    }

    let lower = trimmed.to_lowercase();
    for (needles, title) in CHAT_RULES {
        if needles.iter().any(|n| lower.contains(n)) {
            return title.to_string();
        }
    }
    truncated(trimmed)
}

fn structural_title(query: &str) -> Option<String> {
    let caps = sql_statement_re().captures(query)?;
    let verb = caps.get(1)?.as_str().to_lowercase();
    let rest = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

    let target = match verb.as_str() {
        "update" => first_word_re().captures(rest),
        _ => target_re().captures(rest),
    }
    .and_then(|c| c.get(1))
    .map(|m| clean_identifier(m.as_str()))
    .filter(|t| !t.is_empty());

    Some(match target {
        Some(target) => format!("{} {}", title_case(&verb), title_case(&target)),
        None => title_case(&verb),
    })
}

/// Strip quoting and schema qualifiers: `"public"."order_items"` -> `order items`
fn clean_identifier(raw: &str) -> String {
    let unquoted: String = raw
        .chars()
        .filter(|c| !matches!(c, '`' | '"' | '[' | ']'))
        .collect();
    let last = unquoted.rsplit('.').next().unwrap_or_default();
    last.replace('_', " ").trim().to_string()
}

fn keyword_title(q: &str) -> Option<&'static str> {
    let has = |s: &str| q.contains(s);

    if has("inventory") || has("stock") {
        if has("sum") || has("total") {
            if has("value") {
                return Some("Inventory Total Value");
            }
            if has("quantity") {
                return Some("Inventory Total Quantity");
            }
            return Some("Inventory Sum");
        }
        if has("count") {
            return Some("Inventory Count");
        }
        if has("low") || has("< ") {
            return Some("Low Stock Items");
        }
        if has("expired") {
            return Some("Expired Inventory");
        }
        return Some("Inventory Query");
    }

    if has("sales") {
        if has("monthly") {
            return Some("Monthly Sales Report");
        }
        if has("daily") {
            return Some("Daily Sales Report");
        }
        if has("annual") {
            return Some("Annual Sales");
        }
        if has("top") {
            return Some("Top Sales");
        }
        return Some("Sales Query");
    }

    if has("customer") {
        if has("order") {
            return Some("Customer Orders");
        }
        if has("top") {
            return Some("Top Customers");
        }
        if has("new") {
            return Some("New Customers");
        }
        return Some("Customer Query");
    }

    if has("product") {
        if has("price") {
            return Some("Product Prices");
        }
        if has("category") {
            return Some("Product Categories");
        }
        if has("top") {
            return Some("Top Products");
        }
        return Some("Product Query");
    }

    if has("order") {
        if has("recent") {
            return Some("Recent Orders");
        }
        if has("pending") {
            return Some("Pending Orders");
        }
        if has("status") {
            return Some("Order Status");
        }
        return Some("Order Query");
    }

    None
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn truncated(s: &str) -> String {
    if s.chars().count() > TRUNCATE_AT {
        let prefix: String = s.chars().take(TRUNCATE_AT).collect();
        format!("{}...", prefix)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_rule() {
        assert_eq!(query_title("SELECT * FROM sales"), "Select Sales");
        assert_eq!(query_title("select id, name\nfrom public.order_items"), "Select Order Items");
        assert_eq!(query_title("UPDATE \"users\" SET x = 1"), "Update Users");
        assert_eq!(query_title("insert into logs values (1)"), "Insert Logs");
        assert_eq!(query_title("DELETE FROM sessions WHERE 1=1"), "Delete Sessions");
        assert_eq!(query_title("SELECT 1"), "Select");
    }

    #[test]
    fn test_keyword_rule() {
        assert_eq!(query_title("show inventory total value"), "Inventory Total Value");
        assert_eq!(query_title("monthly sales by region"), "Monthly Sales Report");
        assert_eq!(query_title("top customers this year"), "Top Customers");
        assert_eq!(query_title("pending orders"), "Pending Orders");
    }

    #[test]
    fn test_fallback_truncates() {
        assert_eq!(query_title("how many rows"), "how many rows");
        let long = "count the number of distinct visitors per weekday";
        assert_eq!(query_title(long), "count the number of distinct v...");
        assert_eq!(query_title(long), query_title(long));
    }

    #[test]
    fn test_chat_titles() {
        assert_eq!(chat_title("select everything from users"), "Data Query Chat");
        assert_eq!(chat_title("why is this slow?"), "Query Optimization Chat");
        assert_eq!(chat_title("   "), DEFAULT_CHAT_TITLE);
        assert_eq!(chat_title("hello there"), "hello there");
        assert_eq!(
            chat_title("tell me a long story about the database world"),
            "tell me a long story about the..."
        );
    }
}
