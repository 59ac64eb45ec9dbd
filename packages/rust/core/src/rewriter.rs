//! Article rewriting with a deterministic fallback.
//!
//! [`Rewriter::rewrite`] always produces non-empty text: when the provider
//! fails, the original content is wrapped in a fixed template instead.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::provider::TextGenerator;

/// Rendered in place of a reference that yielded no text.
const MISSING_REFERENCE_TEXT: &str = "N/A";

/// Where the rewritten text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOrigin {
    /// The generative provider produced the text.
    Provider,
    /// The provider failed; the fallback template was used.
    Fallback { reason: String },
}

/// Output of the rewrite stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Rewritten article body. Never empty.
    pub text: String,
    pub origin: RewriteOrigin,
}

impl Rewrite {
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, RewriteOrigin::Fallback { .. })
    }
}

/// Rewrites an article body using an injected [`TextGenerator`].
#[derive(Debug, Clone)]
pub struct Rewriter {
    generator: Arc<dyn TextGenerator>,
}

impl Rewriter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Rewrite `original` using up to two reference texts.
    ///
    /// `ref2` may be empty and is then marked as not available in the prompt.
    #[instrument(skip_all, fields(provider = self.generator.name()))]
    pub async fn rewrite(&self, original: &str, ref1: &str, ref2: &str) -> Rewrite {
        let prompt = build_prompt(original, ref1, ref2);

        let reason = match self.generator.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                info!(chars = text.chars().count(), "provider rewrite received");
                return Rewrite {
                    text,
                    origin: RewriteOrigin::Provider,
                };
            }
            Ok(_) => "provider returned an empty completion".to_string(),
            Err(e) => e.to_string(),
        };

        warn!(%reason, "provider unavailable, using fallback rewrite");
        Rewrite {
            text: fallback_rewrite(original),
            origin: RewriteOrigin::Fallback { reason },
        }
    }
}

/// The prompt sent to the provider.
pub fn build_prompt(original: &str, ref1: &str, ref2: &str) -> String {
    let ref2 = if ref2.trim().is_empty() {
        MISSING_REFERENCE_TEXT
    } else {
        ref2
    };

    format!(
        "\nRewrite the article professionally using the references.\n\n\
         Original:\n{original}\n\n\
         Reference 1:\n{ref1}\n\n\
         Reference 2:\n{ref2}\n"
    )
}

/// The deterministic rewrite used when the provider is unavailable.
pub fn fallback_rewrite(original: &str) -> String {
    format!(
        "\n(UPDATED ARTICLE)\n\n\
         {original}\n\n\
         This article has been enhanced using insights from industry-leading\n\
         customer service resources. The structure, clarity, and readability\n\
         have been improved while preserving the original intent.\n\n\
         Key improvements:\n\
         - Clearer problem explanations\n\
         - Actionable solutions\n\
         - Professional tone\n\n\
         References:\n\
         - IBM Customer Service\n\
         - Industry blogs\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use enricher_shared::{EnricherError, Result};
    use std::sync::Mutex;

    /// Records prompts and replies with a fixed outcome.
    #[derive(Debug)]
    struct ScriptedGenerator {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn ok(text: &str) -> Self {
            Self {
                reply: Ok(text.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                reply: Err(msg.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(EnricherError::Provider)
        }
    }

    #[test]
    fn prompt_embeds_original_and_references() {
        let prompt = build_prompt("ORIGINAL", "REF ONE", "REF TWO");
        assert!(prompt.contains("Rewrite the article professionally using the references."));
        assert!(prompt.contains("Original:\nORIGINAL"));
        assert!(prompt.contains("Reference 1:\nREF ONE"));
        assert!(prompt.contains("Reference 2:\nREF TWO"));
    }

    #[test]
    fn prompt_marks_missing_second_reference() {
        let prompt = build_prompt("ORIGINAL", "REF ONE", "");
        assert!(prompt.contains("Reference 2:\nN/A"));
    }

    #[test]
    fn fallback_contains_original_verbatim() {
        let original = "Line one.\n\n  Indented line two.";
        let text = fallback_rewrite(original);
        assert!(text.contains(original));
        assert!(text.contains("(UPDATED ARTICLE)"));
        assert!(text.contains("Key improvements:"));
        assert!(text.contains("- IBM Customer Service"));
    }

    #[test]
    fn fallback_is_deterministic() {
        assert_eq!(fallback_rewrite("same"), fallback_rewrite("same"));
    }

    #[tokio::test]
    async fn provider_success_is_used() {
        let generator = Arc::new(ScriptedGenerator::ok("A better article."));
        let rewriter = Rewriter::new(generator.clone());

        let rewrite = rewriter.rewrite("orig", "r1", "r2").await;
        assert_eq!(rewrite.text, "A better article.");
        assert_eq!(rewrite.origin, RewriteOrigin::Provider);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("orig"));
    }

    #[tokio::test]
    async fn provider_failure_uses_fallback() {
        let rewriter = Rewriter::new(Arc::new(ScriptedGenerator::failing("quota exceeded")));

        let rewrite = rewriter.rewrite("The original body.", "r1", "").await;
        assert_eq!(rewrite.text, fallback_rewrite("The original body."));
        assert!(rewrite.text.contains("The original body."));
        assert!(rewrite.is_fallback());
        match rewrite.origin {
            RewriteOrigin::Fallback { reason } => assert!(reason.contains("quota exceeded")),
            RewriteOrigin::Provider => panic!("expected fallback"),
        }
    }

    #[tokio::test]
    async fn blank_completion_uses_fallback() {
        let rewriter = Rewriter::new(Arc::new(ScriptedGenerator::ok("   ")));

        let rewrite = rewriter.rewrite("orig", "", "").await;
        assert!(rewrite.is_fallback());
        assert!(!rewrite.text.trim().is_empty());
    }
}
