use crate::types::Message;

#[derive(Debug, Clone)]
struct Entry {
    // Insertion sequence breaks timestamp ties deterministically.
    seq: u64,
    message: Message,
}

/// The single ordered log of all conversation messages.
///
/// Two flows (text and voice) append concurrently and may complete out of the
/// order they started, so a later-arriving message can carry an earlier
/// timestamp. Every append re-sorts by `(timestamp_ms, seq)` instead of
/// binary-inserting; that resort is what reconciles completion order against
/// creation order.
#[derive(Debug, Default)]
pub struct MessageTimeline {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl MessageTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { seq, message });
        self.entries
            .sort_by_key(|e| (e.message.timestamp_ms, e.seq));
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|e| &e.message)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drains the timeline, handing the messages back so the caller can
    /// release any local media they reference.
    pub fn clear(&mut self) -> Vec<Message> {
        self.entries.drain(..).map(|e| e.message).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Sender};

    fn text_at(ts: i64, label: &str) -> Message {
        Message::text(Sender::User, label, ts)
    }

    fn labels(t: &MessageTimeline) -> Vec<String> {
        t.messages()
            .map(|m| match &m.kind {
                crate::types::MessageKind::Text { content } => content.clone(),
                crate::types::MessageKind::Voice { .. } => "<voice>".into(),
            })
            .collect()
    }

    #[test]
    fn appends_stay_sorted_by_timestamp() {
        let mut t = MessageTimeline::new();
        t.append(text_at(30, "c"));
        t.append(text_at(10, "a"));
        t.append(text_at(20, "b"));
        assert_eq!(labels(&t), vec!["a", "b", "c"]);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let mut t = MessageTimeline::new();
        t.append(text_at(5, "first"));
        t.append(text_at(5, "second"));
        t.append(text_at(5, "third"));
        assert_eq!(labels(&t), vec!["first", "second", "third"]);
    }

    #[test]
    fn late_arrival_lands_before_newer_timestamps() {
        // A voice reply that resolved late but was created earlier must sort
        // ahead of a text message created after it.
        let mut t = MessageTimeline::new();
        t.append(text_at(100, "user question"));
        t.append(text_at(300, "newer text"));
        t.append(text_at(200, "late reply"));
        assert_eq!(labels(&t), vec!["user question", "late reply", "newer text"]);
    }

    #[test]
    fn ordering_invariant_holds_after_every_append() {
        let stamps: [i64; 10] = [7, 3, 3, 9, 1, 7, 2, 9, 0, 3];
        let mut t = MessageTimeline::new();
        let mut appended: Vec<(i64, usize)> = Vec::new();

        for (i, &ts) in stamps.iter().enumerate() {
            t.append(text_at(ts, &format!("m{i}")));
            appended.push((ts, i));

            // Expected order: stable sort of everything appended so far.
            let mut expected = appended.clone();
            expected.sort_by_key(|&(ts, seq)| (ts, seq));
            let expected: Vec<String> =
                expected.iter().map(|&(_, i)| format!("m{i}")).collect();

            assert_eq!(labels(&t), expected);
            assert_eq!(t.len(), appended.len());
        }
    }

    #[test]
    fn clear_drains_everything() {
        let mut t = MessageTimeline::new();
        t.append(text_at(1, "a"));
        t.append(text_at(2, "b"));
        let drained = t.clear();
        assert_eq!(drained.len(), 2);
        assert!(t.is_empty());
    }
}
