//! Built-in content: the shipped question catalog and the situation bank.
//! Both can be replaced from the TOML config; these keep the app usable without one.

use crate::domain::{Question, QuestionKind};

fn likert(id: &str, text: &str, category: &str) -> Question {
  Question { id: id.into(), kind: QuestionKind::Likert, text: text.into(), options: None, category: category.into() }
}

fn choice(id: &str, text: &str, options: &[&str], category: &str) -> Question {
  Question {
    id: id.into(),
    kind: QuestionKind::MultipleChoice,
    text: text.into(),
    options: Some(options.iter().map(|o| o.to_string()).collect()),
    category: category.into(),
  }
}

fn open(id: &str, text: &str, category: &str) -> Question {
  Question { id: id.into(), kind: QuestionKind::OpenEnded, text: text.into(), options: None, category: category.into() }
}

/// The 13-question catalog: 7 likert, 3 multiple choice, 3 open ended.
///
/// Multiple-choice options are authored from "most independent" to "most conformist"
/// as far as scoring is concerned; see `scoring::choice_points`.
pub fn default_catalog() -> Vec<Question> {
  vec![
    likert("q1", "Bạn có thường xuyên làm theo những gì bạn bè của bạn làm không?", "conformity"),
    likert("q2", "Bạn có cảm thấy áp lực phải mặc đồ giống như bạn bè của bạn không?", "conformity"),
    likert("q3", "Bạn có sợ bị cô lập nếu không làm theo nhóm không?", "fear_of_exclusion"),
    likert("q4", "Bạn có thường thay đổi ý kiến của mình để phù hợp với đa số không?", "conformity"),
    likert("q5", "Bạn có cảm thấy khó khăn khi nói \"không\" với bạn bè không?", "peer_pressure"),
    choice(
      "q6",
      "Khi có một xu hướng mới ở trường, bạn thường làm gì?",
      &[
        "Tham gia ngay lập tức",
        "Đợi xem phản ứng của mọi người trước",
        "Chỉ tham gia nếu bạn thực sự thích",
        "Không quan tâm đến xu hướng",
      ],
      "trend_following",
    ),
    choice(
      "q7",
      "Nếu nhóm bạn của bạn quyết định làm điều gì đó sai trái, bạn sẽ:",
      &[
        "Tham gia vì không muốn bị xa lánh",
        "Im lặng nhưng không tham gia",
        "Nói rõ ý kiến và từ chối",
        "Cố gắng thuyết phục họ không làm",
      ],
      "peer_pressure",
    ),
    likert("q8", "Bạn có thường xuyên so sánh bản thân với người khác trên mạng xã hội không?", "social_comparison"),
    likert("q9", "Bạn có cảm thấy lo lắng khi không được mời vào các nhóm chat của bạn bè không?", "fear_of_exclusion"),
    choice(
      "q10",
      "Khi đưa ra quyết định quan trọng, yếu tố nào ảnh hưởng đến bạn nhiều nhất?",
      &[
        "Ý kiến của bạn bè",
        "Ý kiến của gia đình",
        "Suy nghĩ của chính bạn",
        "Những gì phổ biến trên mạng xã hội",
      ],
      "decision_making",
    ),
    open("q11", "Hãy kể về một lần bạn cảm thấy áp lực phải làm theo nhóm. Bạn đã phản ứng như thế nào?", "peer_pressure"),
    open("q12", "Theo bạn, điều gì khiến học sinh dễ bị ảnh hưởng bởi hành vi bầy đàn?", "awareness"),
    open("q13", "Theo bạn, điều gì khiến học sinh dễ bị ảnh hưởng bởi hành vi bầy đàn?", "awareness"),
  ]
}

/// Scenarios for the situational-response exercise.
pub fn default_situations() -> Vec<String> {
  vec![
    "Nhóm bạn của bạn rủ đi trốn học để chơi game. Bạn sẽ làm gì?".into(),
    "Một người bạn trong nhóm bị mọi người cô lập vì ý kiến khác biệt. Bạn sẽ phản ứng ra sao?".into(),
    "Bạn thấy bạn mình gian lận trong bài kiểm tra và được cả nhóm ủng hộ. Bạn có làm theo không?".into(),
  ]
}

/// Check a catalog before accepting it: ids unique and non-empty, options present
/// iff the question is multiple choice (and then non-empty).
pub fn validate_catalog(catalog: &[Question]) -> Result<(), String> {
  let mut seen = std::collections::HashSet::new();
  for q in catalog {
    if q.id.trim().is_empty() {
      return Err("question with empty id".into());
    }
    if !seen.insert(q.id.as_str()) {
      return Err(format!("duplicate question id '{}'", q.id));
    }
    match (q.kind, &q.options) {
      (QuestionKind::MultipleChoice, Some(opts)) if !opts.is_empty() => {}
      (QuestionKind::MultipleChoice, _) => {
        return Err(format!("question '{}' is multiple_choice but has no options", q.id));
      }
      (_, Some(_)) => return Err(format!("question '{}' has options but is not multiple_choice", q.id)),
      (_, None) => {}
    }
  }
  Ok(())
}
