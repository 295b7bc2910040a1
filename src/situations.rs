//! Situational-response exercise: hand out a random scenario from the bank.

use rand::seq::SliceRandom;
use tokio::sync::RwLock;

pub struct SituationBank {
  items: Vec<String>,
  last: RwLock<Option<usize>>,
}

impl SituationBank {
  pub fn new(items: Vec<String>) -> Self {
    Self { items, last: RwLock::new(None) }
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// Random scenario, avoiding an immediate repeat when the bank has more than one.
  pub async fn pick(&self) -> Option<String> {
    let mut last = self.last.write().await;
    let candidates: Vec<usize> = (0..self.items.len()).filter(|i| self.items.len() == 1 || Some(*i) != *last).collect();
    let chosen = *candidates.choose(&mut rand::thread_rng())?;
    *last = Some(chosen);
    Some(self.items[chosen].clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeds::default_situations;

  #[tokio::test]
  async fn never_repeats_back_to_back() {
    let bank = SituationBank::new(default_situations());
    let mut prev = bank.pick().await.unwrap();
    for _ in 0..20 {
      let next = bank.pick().await.unwrap();
      assert_ne!(next, prev);
      prev = next;
    }
  }

  #[tokio::test]
  async fn single_and_empty_banks() {
    let one = SituationBank::new(vec!["only".into()]);
    assert_eq!(one.pick().await.as_deref(), Some("only"));
    assert_eq!(one.pick().await.as_deref(), Some("only"));
    assert!(SituationBank::new(vec![]).pick().await.is_none());
  }
}
