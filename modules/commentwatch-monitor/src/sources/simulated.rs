use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rand::seq::IndexedRandom;
use rand::Rng;

use commentwatch_common::RawComment;

use super::CommentSource;

/// (author, content, age, likes) rows the demo generator draws from.
const TEMPLATES: &[(&str, &str, &str, i64)] = &[
    ("用户A", "这个视频很棒！", "刚刚", 2),
    ("用户B", "点赞支持！", "1分钟前", 0),
    ("用户C", "期待更新", "5分钟前", 10),
];

/// Demo source used when no browser is available. Each fetch returns one or
/// two comments drawn from a fixed template set, with ids derived from the
/// current unix second and the comment's position in the batch.
#[derive(Debug, Default)]
pub struct SimulatedSource;

impl SimulatedSource {
    pub fn new() -> Self {
        Self
    }

    fn generate(&self, rng: &mut impl Rng) -> Vec<RawComment> {
        let count = rng.random_range(1..=2);
        let second = Utc::now().timestamp();

        (0..count)
            .filter_map(|i| {
                let (author, content, age, likes) = TEMPLATES.choose(rng)?;
                Some(RawComment::new(
                    format!("comment_{second}_{i}"),
                    *author,
                    *content,
                    *age,
                    *likes,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl CommentSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn fetch(&self, _video_ref: &str) -> Result<Vec<RawComment>> {
        Ok(self.generate(&mut rand::rng()))
    }
}
