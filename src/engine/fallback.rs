//! Scheme/host fallback policy for HTTP engines
//!
//! The policy is plain data: an ordered list of URL builders applied to the
//! base domain. [`first_success`] walks it and stops at the first attempt
//! that yields a value, so the order can be tested without any transport.

use std::future::Future;

/// Builds one candidate URL from a base domain
pub type UrlVariant = fn(&str) -> String;

fn https_bare(domain: &str) -> String {
    format!("https://{}", domain)
}

fn https_www(domain: &str) -> String {
    format!("https://www.{}", domain)
}

fn http_bare(domain: &str) -> String {
    format!("http://{}", domain)
}

fn http_www(domain: &str) -> String {
    format!("http://www.{}", domain)
}

/// Attempt order shared by every HTTP engine
pub const FALLBACK_SEQUENCE: [UrlVariant; 4] = [https_bare, https_www, http_bare, http_www];

/// Returns the candidate URLs for a domain in attempt order
pub fn fallback_urls(domain: &str) -> Vec<String> {
    FALLBACK_SEQUENCE
        .iter()
        .map(|variant| variant(domain))
        .collect()
}

/// Runs `attempt` against each fallback URL until one returns `Some`
///
/// Attempts are strictly sequential. Returns `None` once the sequence is
/// exhausted.
pub async fn first_success<T, F, Fut>(domain: &str, mut attempt: F) -> Option<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for url in fallback_urls(domain) {
        if let Some(result) = attempt(url).await {
            return Some(result);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_fallback_order() {
        assert_eq!(
            fallback_urls("example.com"),
            vec![
                "https://example.com",
                "https://www.example.com",
                "http://example.com",
                "http://www.example.com",
            ]
        );
    }

    async fn run_until(succeed_on: usize) -> (Option<String>, Vec<String>) {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let seen = attempts.clone();
        let result = first_success("example.com", move |url| {
            let seen = seen.clone();
            async move {
                let mut seen = seen.lock().unwrap();
                seen.push(url.clone());
                if seen.len() == succeed_on {
                    Some(url)
                } else {
                    None
                }
            }
        })
        .await;
        let attempts = attempts.lock().unwrap().clone();
        (result, attempts)
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        for k in 1..=4 {
            let (result, attempts) = run_until(k).await;
            assert_eq!(attempts.len(), k);
            assert_eq!(result.as_deref(), Some(fallback_urls("example.com")[k - 1].as_str()));
            assert_eq!(attempts, fallback_urls("example.com")[..k].to_vec());
        }
    }

    #[tokio::test]
    async fn test_exhausted_sequence_returns_none() {
        let (result, attempts) = run_until(usize::MAX).await;
        assert!(result.is_none());
        assert_eq!(attempts.len(), 4);
    }
}
