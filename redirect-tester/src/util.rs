#[must_use]
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::split_csv;

    #[test]
    fn split_csv_trims_and_drops_empty() {
        assert_eq!(split_csv(" a, ,b,"), vec!["a".to_string(), "b".to_string()]);
        assert!(split_csv("").is_empty());
    }
}
