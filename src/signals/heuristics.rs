//! Deterministic heuristic signal providers
//!
//! These replace keyless third-party lookups with pure functions of their
//! input: table lookups for IP and email reputation, lexical scoring for text
//! and descriptions, and a domain check for images. Given the same input they
//! always return the same risk, which keeps score recomputation idempotent.

use async_trait::async_trait;

use super::{
    DescriptionRiskProvider, EmailRiskProvider, ImageRiskProvider, IpRiskProvider, SignalError,
    TextRiskProvider,
};

// ============================================================================
// IP reputation
// ============================================================================

/// Flags source IPs whose prefix matches a known proxy / VPN / datacenter
/// range. Listed prefixes score maximum risk, everything else scores zero.
pub struct ProxyPrefixTable {
    prefixes: Vec<String>,
}

impl ProxyPrefixTable {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }
}

impl Default for ProxyPrefixTable {
    fn default() -> Self {
        // Well-known Tor exit and hosting-provider ranges
        Self::new(
            ["185.220.", "171.25.193.", "104.244.72.", "45.154.", "199.249.230."]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }
}

#[async_trait]
impl IpRiskProvider for ProxyPrefixTable {
    async fn check_ip_risk(&self, ip: &str) -> Result<f64, SignalError> {
        if self.prefixes.iter().any(|p| ip.starts_with(p.as_str())) {
            Ok(1.0)
        } else {
            Ok(0.0)
        }
    }
}

// ============================================================================
// Disposable email
// ============================================================================

/// Checks the address domain against a table of disposable-mail providers.
pub struct DisposableEmailTable {
    domains: Vec<String>,
}

impl DisposableEmailTable {
    pub fn new(domains: Vec<String>) -> Self {
        Self { domains }
    }
}

impl Default for DisposableEmailTable {
    fn default() -> Self {
        Self::new(
            [
                "mailinator.com",
                "guerrillamail.com",
                "10minutemail.com",
                "tempmail.com",
                "trashmail.com",
                "yopmail.com",
                "sharklasers.com",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
    }
}

#[async_trait]
impl EmailRiskProvider for DisposableEmailTable {
    async fn check_email_disposable(&self, email: &str) -> Result<f64, SignalError> {
        let domain = match email.rsplit_once('@') {
            Some((_, domain)) => domain.to_lowercase(),
            None => return Err(SignalError::Lookup(format!("malformed email: {email}"))),
        };

        if self.domains.iter().any(|d| domain == *d) {
            Ok(1.0)
        } else {
            Ok(0.0)
        }
    }
}

// ============================================================================
// Review text linguistics
// ============================================================================

const SPAM_PHRASES: &[&str] = &["amazing product", "highly recommend", "must buy", "best ever"];

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "awesome", "best", "excellent", "fantastic", "good", "great", "love", "loved",
    "perfect", "wonderful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "awful", "bad", "broken", "disappointing", "hate", "hated", "horrible", "terrible", "useless",
    "worst",
];

// Words that mark an opinionated register without carrying polarity
const OPINION_WORDS: &[&str] = &[
    "think", "feel", "felt", "believe", "seems", "probably", "maybe", "honestly", "personally",
    "really", "quite",
];

/// Lexical stand-in for a sentiment model: estimates polarity and
/// subjectivity from small word lists, then applies the additive risk rules
/// (spam phrases, bot-like extreme sentiment, shouting, overly objective
/// text).
#[derive(Default)]
pub struct LexicalTextAnalyzer;

struct SentimentEstimate {
    polarity: f64,
    subjectivity: f64,
}

impl LexicalTextAnalyzer {
    fn estimate_sentiment(words: &[String]) -> SentimentEstimate {
        let mut positive = 0usize;
        let mut negative = 0usize;
        let mut subjective = 0usize;

        for word in words {
            if POSITIVE_WORDS.contains(&word.as_str()) {
                positive += 1;
                subjective += 1;
            } else if NEGATIVE_WORDS.contains(&word.as_str()) {
                negative += 1;
                subjective += 1;
            } else if OPINION_WORDS.contains(&word.as_str()) {
                subjective += 1;
            }
        }

        let polar_total = positive + negative;
        let polarity = if polar_total > 0 {
            (positive as f64 - negative as f64) / polar_total as f64
        } else {
            0.0
        };
        let subjectivity = if words.is_empty() {
            0.0
        } else {
            subjective as f64 / words.len() as f64
        };

        SentimentEstimate {
            polarity,
            subjectivity,
        }
    }
}

fn normalized_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

#[async_trait]
impl TextRiskProvider for LexicalTextAnalyzer {
    async fn analyze_text_risk(&self, text: &str) -> Result<f64, SignalError> {
        let words = normalized_words(text);
        if words.len() < 5 {
            // Too short to say anything meaningful
            return Ok(0.9);
        }

        let lower = text.to_lowercase();
        let mut risk: f64 = 0.0;

        if SPAM_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
            risk += 0.4;
        }

        let sentiment = Self::estimate_sentiment(&words);
        if sentiment.polarity.abs() > 0.8 && sentiment.subjectivity < 0.3 {
            // Extreme sentiment with no opinionated register reads bot-like
            risk += 0.5;
        }

        let has_letters = text.chars().any(|c| c.is_alphabetic());
        let all_caps = has_letters && !text.chars().any(|c| c.is_lowercase());
        if all_caps || text.matches('!').count() > 5 {
            risk += 0.3;
        }

        if sentiment.subjectivity < 0.2 {
            risk += 0.2;
        }

        Ok(risk.min(1.0))
    }
}

// ============================================================================
// Product descriptions
// ============================================================================

const HIGH_PRESSURE_PHRASES: &[&str] = &["limited time", "hurry", "act now", "100% genuine"];

/// Flags high-pressure sales language and under-length descriptions.
#[derive(Default)]
pub struct DescriptionHeuristic;

#[async_trait]
impl DescriptionRiskProvider for DescriptionHeuristic {
    async fn analyze_description_risk(&self, text: &str) -> Result<f64, SignalError> {
        let lower = text.to_lowercase();
        let mut risk: f64 = 0.0;

        if HIGH_PRESSURE_PHRASES.iter().any(|kw| lower.contains(kw)) {
            risk += 0.6;
        }
        if text.split_whitespace().count() < 20 {
            risk += 0.4;
        }

        Ok(risk.min(1.0))
    }
}

// ============================================================================
// Listing images
// ============================================================================

const STOCK_PHOTO_DOMAINS: &[&str] = &[
    "istockphoto",
    "shutterstock",
    "gettyimages",
    "pexels",
    "unsplash",
];

/// Checks image URL hosts for known stock-photo sites. A listing with no
/// images at all scores maximum risk.
#[derive(Default)]
pub struct StockPhotoDetector;

fn url_host(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let host = rest.split(['/', '?', '#']).next()?;
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

#[async_trait]
impl ImageRiskProvider for StockPhotoDetector {
    async fn analyze_image_risk(&self, urls: &[String]) -> Result<f64, SignalError> {
        if urls.is_empty() {
            return Ok(1.0);
        }

        for url in urls {
            // Malformed URLs are skipped rather than penalized
            let Some(host) = url_host(url) else { continue };
            if STOCK_PHOTO_DOMAINS.iter().any(|d| host.contains(d)) {
                return Ok(0.9);
            }
        }

        Ok(0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_proxy_prefix_match() {
        let table = ProxyPrefixTable::default();
        assert_eq!(table.check_ip_risk("185.220.101.5").await.unwrap(), 1.0);
        assert_eq!(table.check_ip_risk("93.184.216.34").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_disposable_email_domains() {
        let table = DisposableEmailTable::default();
        assert_eq!(
            table
                .check_email_disposable("buyer@mailinator.com")
                .await
                .unwrap(),
            1.0
        );
        assert_eq!(
            table
                .check_email_disposable("buyer@example.com")
                .await
                .unwrap(),
            0.0
        );
        assert!(table.check_email_disposable("not-an-email").await.is_err());
    }

    #[tokio::test]
    async fn test_text_too_short() {
        let analyzer = LexicalTextAnalyzer;
        assert_eq!(analyzer.analyze_text_risk("Nice!").await.unwrap(), 0.9);
    }

    #[tokio::test]
    async fn test_text_spam_phrase() {
        let analyzer = LexicalTextAnalyzer;
        let risk = analyzer
            .analyze_text_risk("Amazing product, highly recommend it to everyone I honestly know")
            .await
            .unwrap();
        assert!(risk >= 0.4);
    }

    #[tokio::test]
    async fn test_text_shouting_adds_risk() {
        let analyzer = LexicalTextAnalyzer;
        let quiet = analyzer
            .analyze_text_risk("I think the stitching feels quite sturdy after two weeks of use")
            .await
            .unwrap();
        let shouting = analyzer
            .analyze_text_risk("I THINK THE STITCHING FEELS QUITE STURDY AFTER TWO WEEKS OF USE")
            .await
            .unwrap();
        assert!(shouting > quiet);
    }

    #[tokio::test]
    async fn test_text_deterministic() {
        let analyzer = LexicalTextAnalyzer;
        let text = "Honestly a good jacket, I feel the zipper is quite solid";
        let a = analyzer.analyze_text_risk(text).await.unwrap();
        let b = analyzer.analyze_text_risk(text).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_description_high_pressure_and_short() {
        let heuristic = DescriptionHeuristic;
        let risk = heuristic
            .analyze_description_risk("Hurry! Limited time offer, 100% genuine!")
            .await
            .unwrap();
        // High-pressure (0.6) plus under-length (0.4), clamped
        assert_eq!(risk, 1.0);

        let risk = heuristic
            .analyze_description_risk(
                "A waxed canvas field jacket with a quilted liner, brass hardware, \
                 four bellows pockets and an adjustable storm hood for wet autumn weather",
            )
            .await
            .unwrap();
        assert_eq!(risk, 0.0);
    }

    #[tokio::test]
    async fn test_image_risk_levels() {
        let detector = StockPhotoDetector;
        assert_eq!(detector.analyze_image_risk(&[]).await.unwrap(), 1.0);

        let stock = vec!["https://images.shutterstock.com/photo/1.jpg".to_string()];
        assert_eq!(detector.analyze_image_risk(&stock).await.unwrap(), 0.9);

        let own = vec!["https://cdn.example-store.com/p/1.jpg".to_string()];
        assert_eq!(detector.analyze_image_risk(&own).await.unwrap(), 0.1);

        // Malformed URL is ignored, not penalized
        let mixed = vec![
            ":///".to_string(),
            "https://cdn.example-store.com/p/2.jpg".to_string(),
        ];
        assert_eq!(detector.analyze_image_risk(&mixed).await.unwrap(), 0.1);
    }

    #[tokio::test]
    async fn test_url_host_extraction() {
        assert_eq!(
            url_host("https://images.pexels.com/photo.jpg"),
            Some("images.pexels.com")
        );
        assert_eq!(url_host("cdn.shop.net/img.png"), Some("cdn.shop.net"));
        assert_eq!(url_host("https://"), None);
    }
}
