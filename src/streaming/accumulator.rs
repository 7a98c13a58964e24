use crate::models::{
    AgentThought, ChatEvent, EventPayload, MessageFile, Metadata, UpstreamError,
};

/// Folds a stream of events into the final answer
///
/// `message` and `agent_message` fragments are appended, `message_replace`
/// overwrites everything received so far, and agent thoughts are kept in
/// position order with later updates of the same thought replacing earlier
/// ones.
#[derive(Debug, Clone, Default)]
pub struct AnswerAccumulator {
    answer: String,
    task_id: Option<String>,
    message_id: Option<String>,
    conversation_id: Option<String>,
    thoughts: Vec<AgentThought>,
    files: Vec<MessageFile>,
    metadata: Option<Metadata>,
    error: Option<UpstreamError>,
}

impl AnswerAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: &ChatEvent) {
        if self.task_id.is_none() && !event.task_id.is_empty() {
            self.task_id = Some(event.task_id.clone());
        }
        if self.message_id.is_none() && !event.message_id.is_empty() {
            self.message_id = Some(event.message_id.clone());
        }

        match &event.payload {
            EventPayload::Message(chunk) | EventPayload::AgentMessage(chunk) => {
                self.note_conversation(&chunk.conversation_id);
                self.answer.push_str(&chunk.answer);
            }
            EventPayload::MessageReplace(replace) => {
                self.note_conversation(&replace.conversation_id);
                self.answer.clone_from(&replace.answer);
            }
            EventPayload::AgentThought(thought) => {
                self.note_conversation(&thought.conversation_id);
                self.upsert_thought(thought);
            }
            EventPayload::MessageFile(file) => {
                self.note_conversation(&file.conversation_id);
                self.files.push(file.clone());
            }
            EventPayload::MessageEnd(end) => {
                self.note_conversation(&end.conversation_id);
                self.metadata = Some(end.metadata.clone());
            }
            EventPayload::Error(err) => self.error = Some(err.clone()),
            EventPayload::Unknown => {}
        }
    }

    fn note_conversation(&mut self, conversation_id: &str) {
        if self.conversation_id.is_none() && !conversation_id.is_empty() {
            self.conversation_id = Some(conversation_id.to_string());
        }
    }

    fn upsert_thought(&mut self, thought: &AgentThought) {
        let existing = self
            .thoughts
            .iter_mut()
            .find(|t| !thought.id.is_empty() && t.id == thought.id);

        match existing {
            Some(slot) => *slot = thought.clone(),
            None => {
                self.thoughts.push(thought.clone());
                self.thoughts.sort_by_key(|t| t.position);
            }
        }
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// Id to pass back when continuing this conversation
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn thoughts(&self) -> &[AgentThought] {
        &self.thoughts
    }

    pub fn files(&self) -> &[MessageFile] {
        &self.files
    }

    /// Present once `message_end` was seen
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn upstream_error(&self) -> Option<&UpstreamError> {
        self.error.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn into_answer(self) -> String {
        self.answer
    }
}
