//! Naming conventions: accessor prefixes, natural names and plurals.

/// Prefix of a property or collection getter.
pub const GET_PREFIX: &str = "get";
/// Prefix of a boolean property getter.
pub const IS_PREFIX: &str = "is";

/// Upper-cases the first character.
#[must_use]
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-cases the first character, unless the name starts with an acronym
/// (`URL` stays `URL`, `Total` becomes `total`).
#[must_use]
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if chars.next().is_some_and(char::is_uppercase) && first.is_uppercase() {
        return name.to_string();
    }
    first.to_lowercase().chain(name.chars().skip(1)).collect()
}

/// Strips `prefix` from `name` if what follows starts a new word.
///
/// `getTotal` yields `Total`; `getaway` and `get` yield `None`.
#[must_use]
pub fn strip_prefix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?;
    let first = rest.chars().next()?;
    (first.is_uppercase() || first.is_ascii_digit()).then_some(rest)
}

/// The member id a getter stands for: `getTotal` → `total`, `isPaid` →
/// `paid` (boolean getters only).
#[must_use]
pub fn accessor_member_id(method_name: &str, returns_boolean: bool) -> Option<String> {
    if let Some(rest) = strip_prefix(method_name, GET_PREFIX) {
        return Some(decapitalize(rest));
    }
    if returns_boolean && let Some(rest) = strip_prefix(method_name, IS_PREFIX) {
        return Some(decapitalize(rest));
    }
    None
}

/// Splits a camel-case identifier into capitalized words.
///
/// ```
/// use kestrel_metamodel::naming::natural_name;
///
/// assert_eq!(natural_name("firstName"), "First Name");
/// assert_eq!(natural_name("totalVAT"), "Total VAT");
/// assert_eq!(natural_name("URLParser"), "URL Parser");
/// ```
#[must_use]
pub fn natural_name(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().filter(|c| *c != '_').collect();
    let mut out = String::with_capacity(chars.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push(' ');
            }
        }
        if i == 0 {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// English plural of a singular noun phrase; only the last word changes.
#[must_use]
pub fn plural(singular: &str) -> String {
    let lower = singular.to_lowercase();
    if lower.ends_with('y') && !lower.ends_with("ay") && !lower.ends_with("ey") && !lower.ends_with("oy") {
        return format!("{}ies", &singular[..singular.len() - 1]);
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{singular}es");
    }
    format!("{singular}s")
}

/// The member id a mixin class contributes: the simple name's suffix after
/// the last `_`, decapitalized (`Order_submit` → `submit`).
#[must_use]
pub fn mixin_member_id(simple_name: &str) -> String {
    let suffix = simple_name.rsplit('_').next().unwrap_or(simple_name);
    decapitalize(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalization() {
        assert_eq!(capitalize("total"), "Total");
        assert_eq!(capitalize(""), "");
        assert_eq!(decapitalize("Total"), "total");
        assert_eq!(decapitalize("URL"), "URL");
        assert_eq!(decapitalize("A"), "a");
    }

    #[test]
    fn prefixes_must_start_a_word() {
        assert_eq!(strip_prefix("getTotal", "get"), Some("Total"));
        assert_eq!(strip_prefix("get2ndLine", "get"), Some("2ndLine"));
        assert_eq!(strip_prefix("getaway", "get"), None);
        assert_eq!(strip_prefix("get", "get"), None);
    }

    #[test]
    fn accessor_ids() {
        assert_eq!(accessor_member_id("getTotal", false), Some("total".into()));
        assert_eq!(accessor_member_id("isPaid", true), Some("paid".into()));
        assert_eq!(accessor_member_id("isPaid", false), None);
        assert_eq!(accessor_member_id("submit", false), None);
    }

    #[test]
    fn natural_names() {
        assert_eq!(natural_name("total"), "Total");
        assert_eq!(natural_name("placedOn"), "Placed On");
        assert_eq!(natural_name("line2Total"), "Line2 Total");
        assert_eq!(natural_name("Order"), "Order");
    }

    #[test]
    fn plurals() {
        assert_eq!(plural("Order"), "Orders");
        assert_eq!(plural("Category"), "Categories");
        assert_eq!(plural("Day"), "Days");
        assert_eq!(plural("Address"), "Addresses");
        assert_eq!(plural("Box"), "Boxes");
        assert_eq!(plural("Batch"), "Batches");
    }

    #[test]
    fn mixin_ids() {
        assert_eq!(mixin_member_id("Order_submit"), "submit");
        assert_eq!(mixin_member_id("Customer_recentOrders"), "recentOrders");
        assert_eq!(mixin_member_id("Contributions"), "contributions");
    }
}
