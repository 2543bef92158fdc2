//! System instruction builder for the bookseller persona.
//!
//! [`PromptBuilder`] renders the persona rules followed by the current
//! product list.  The Gemini generator sends the result as the first user
//! entry of every conversation, answered by [`PRIMER_ACK`].

use crate::catalog::Product;

// ---------------------------------------------------------------------------
// Persona
// ---------------------------------------------------------------------------

const PERSONA_INSTRUCTION: &str = "\
あなたはECサイトの親切なAI書店員です。
名前は福蔵です。
以下の商品リストにある情報を元に、商品をおすすめしたり、質問に答えてください。
おすすめする商品は3つまでにしてください。
リストにない情報は「申し訳ありません、その情報についてはわかりかねます」と答えてください。
回答は、音声合成で読み上げられることを想定して、以下の点に注意してください：
1. 長すぎない、自然な話し言葉（です・ます調）を使う。
2. URLそのものの読み上げや、記号的な表現は避ける。
3. 感情を込めたような表現（！など）は適度に使用可。
4. 商品をおすすめする際は、必ず「[商品名](/books/商品ID)」という形式でリンクを作成してください。
   例: 「こちらの[走れメロス](/books/1)はいかがでしょうか？」";

/// Model reply that follows the system instruction in the primed history.
pub const PRIMER_ACK: &str = "かしこまりました。商品リストを把握しました。お客様の接客を始めます。";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the system context handed to the text generator.
///
/// # Example
/// ```rust
/// use ec_voice_bot::llm::PromptBuilder;
///
/// let system = PromptBuilder::new(500).build_system(&[]);
/// assert!(system.contains("福蔵"));
/// assert!(system.ends_with("商品リスト:\n"));
/// ```
pub struct PromptBuilder {
    product_limit: usize,
}

impl PromptBuilder {
    /// `product_limit` caps how many products are listed.
    pub fn new(product_limit: usize) -> Self {
        Self { product_limit }
    }

    /// Persona rules followed by one line per product.
    pub fn build_system(&self, products: &[Product]) -> String {
        let mut prompt = String::with_capacity(1024 + products.len().min(self.product_limit) * 128);
        prompt.push_str(PERSONA_INSTRUCTION);
        prompt.push_str("\n\n商品リスト:\n");
        for product in products.iter().take(self.product_limit) {
            prompt.push_str(&product_line(product));
            prompt.push('\n');
        }
        prompt
    }
}

/// `- (ID: 1) title (category, ¥price): description`
pub fn product_line(p: &Product) -> String {
    format!(
        "- (ID: {}) {} ({}, ¥{}): {}",
        p.id, p.title, p.category, p.price, p.description
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
