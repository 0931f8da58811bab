use rust_decimal::Decimal;
use std::str::FromStr;

/// What happens when a purchased product is used. Parsed from the product
/// name: multiplier products carry a factor token like "2x" or "x1.5",
/// function products are matched by keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductEffect {
    Multiplier(Decimal),
    Function(ProductFunction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFunction {
    Reverse,
    Uppercase,
    WordCount,
}

impl ProductFunction {
    pub fn apply(&self, argument: &str) -> String {
        match self {
            ProductFunction::Reverse => argument.chars().rev().collect(),
            ProductFunction::Uppercase => argument.to_uppercase(),
            ProductFunction::WordCount => argument.split_whitespace().count().to_string(),
        }
    }
}

pub fn parse_product_name(name: &str) -> Option<ProductEffect> {
    let lowered = name.to_lowercase();

    if lowered.contains("multiplier") {
        return multiplier_factor(&lowered).map(ProductEffect::Multiplier);
    }
    if lowered.contains("revers") {
        return Some(ProductEffect::Function(ProductFunction::Reverse));
    }
    if lowered.contains("upper") {
        return Some(ProductEffect::Function(ProductFunction::Uppercase));
    }
    if lowered.contains("word count") || lowered.contains("counter") {
        return Some(ProductEffect::Function(ProductFunction::WordCount));
    }
    None
}

// Accepts "2x", "x2" and decimal factors like "1.5x".
fn multiplier_factor(lowered: &str) -> Option<Decimal> {
    for token in lowered.split_whitespace() {
        let number = token
            .strip_suffix('x')
            .or_else(|| token.strip_prefix('x'))
            .unwrap_or(token);
        if number.is_empty() {
            continue;
        }
        if let Ok(value) = Decimal::from_str(number) {
            if value > Decimal::ZERO {
                return Some(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiplier_factors() {
        assert_eq!(
            parse_product_name("2x Multiplier"),
            Some(ProductEffect::Multiplier(Decimal::from(2)))
        );
        assert_eq!(
            parse_product_name("Multiplier x3"),
            Some(ProductEffect::Multiplier(Decimal::from(3)))
        );
        assert_eq!(
            parse_product_name("1.5x Multiplier"),
            Some(ProductEffect::Multiplier(Decimal::from_str("1.5").unwrap()))
        );
    }

    #[test]
    fn multiplier_without_factor_is_unusable() {
        assert_eq!(parse_product_name("Multiplier"), None);
    }

    #[test]
    fn parses_function_products() {
        assert_eq!(
            parse_product_name("Text Reverser"),
            Some(ProductEffect::Function(ProductFunction::Reverse))
        );
        assert_eq!(
            parse_product_name("Uppercaser Deluxe"),
            Some(ProductEffect::Function(ProductFunction::Uppercase))
        );
        assert_eq!(
            parse_product_name("Word Counter"),
            Some(ProductEffect::Function(ProductFunction::WordCount))
        );
    }

    #[test]
    fn plain_goods_have_no_effect() {
        assert_eq!(parse_product_name("Golden Hoodie"), None);
    }

    #[test]
    fn functions_apply() {
        assert_eq!(ProductFunction::Reverse.apply("abc"), "cba");
        assert_eq!(ProductFunction::Uppercase.apply("abc"), "ABC");
        assert_eq!(ProductFunction::WordCount.apply("one two  three"), "3");
    }
}
