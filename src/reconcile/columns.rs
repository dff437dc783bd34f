//! Column name normalization

/// Lowercases acronyms inside a word: `URLs` becomes `Urls`, `PRICE` becomes `price`
fn normalize_word(word: &str) -> String {
    if !word.chars().any(char::is_lowercase) {
        return word.to_lowercase();
    }

    let mut result = String::with_capacity(word.len());
    let mut previous_upper = false;
    for c in word.chars() {
        if c.is_uppercase() && previous_upper {
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
        previous_upper = c.is_uppercase();
    }
    result
}

/// Converts a header to camelCase
///
/// Words are split on whitespace, `_` and `-`. Headers that are already
/// camelCase stay as they are; acronyms are folded so `Image URLs` and
/// `imageUrls` agree.
///
/// ```
/// use furnish_scout::reconcile::to_camel_case;
///
/// assert_eq!(to_camel_case("Product Name"), "productName");
/// assert_eq!(to_camel_case("furniture_type"), "furnitureType");
/// assert_eq!(to_camel_case("productUrl"), "productUrl");
/// assert_eq!(to_camel_case("PRICE"), "price");
/// assert_eq!(to_camel_case("Image URLs"), "imageUrls");
/// ```
pub fn to_camel_case(header: &str) -> String {
    let mut result = String::new();

    for (i, word) in header
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let word = normalize_word(word);
        let mut chars = word.chars();
        let Some(first) = chars.next() else {
            continue;
        };
        if i == 0 {
            result.extend(first.to_lowercase());
        } else {
            result.extend(first.to_uppercase());
        }
        result.push_str(chars.as_str());
    }

    result
}

/// Maps camelCase columns back to the original headers they came from
///
/// Columns without an original counterpart pass through unchanged.
pub fn restore_column_names(columns: &[String], original_headers: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| {
            original_headers
                .iter()
                .find(|header| to_camel_case(header) == *column)
                .cloned()
                .unwrap_or_else(|| column.clone())
        })
        .collect()
}
