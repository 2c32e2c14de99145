//! Display formatting helpers.

/// Title-cases each word: a letter is upper-cased when it does not follow
/// another letter, lower-cased otherwise (`"T2M_std"` becomes `"T2M Std"`).
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

/// Feature column name as a label: underscores become spaces, then
/// [`title_case`].
#[must_use]
pub fn feature_label(name: &str) -> String {
    title_case(&name.replace('_', " "))
}

/// Upper-cases the first character and lower-cases the rest.
#[must_use]
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

/// `value` to `decimals` places with a trailing `%`, or `"n/a"`.
#[must_use]
pub fn percent(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}%")
    } else {
        "n/a".to_string()
    }
}

/// `value` to `decimals` places, or `"n/a"`.
#[must_use]
pub fn fixed(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        "n/a".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_labels_title_case_each_word() {
        assert_eq!(feature_label("T2M_std_change"), "T2M Std Change");
        assert_eq!(feature_label("NDVI_mean_change"), "Ndvi Mean Change");
        assert_eq!(feature_label("early_yield_cv"), "Early Yield Cv");
    }

    #[test]
    fn capitalize_lowercases_the_rest() {
        assert_eq!(capitalize("corn"), "Corn");
        assert_eq!(capitalize("SOYBEAN"), "Soybean");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn non_finite_values_read_as_not_available() {
        assert_eq!(percent(1.234, 2), "1.23%");
        assert_eq!(percent(f64::NAN, 2), "n/a");
        assert_eq!(fixed(0.5664, 3), "0.566");
    }
}
