/// Joins items with `,`, quoting any item that itself contains a comma.
#[must_use]
pub fn serialize_multi_string<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| {
            let item = item.as_ref();
            if item.contains(',') {
                format!("\"{item}\"")
            } else {
                item.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[must_use]
pub fn parse_multi_string(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for ch in raw.chars() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                push_item(&mut items, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_item(&mut items, &current);
    items
}

fn push_item(items: &mut Vec<String>, raw: &str) {
    let item = raw.trim();
    if !item.is_empty() {
        items.push(item.to_string());
    }
}
