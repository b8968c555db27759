use crate::llm::provider::{AssistantInput, LlmProvider, LlmResult};
use crate::mode::Mode;
use crate::session::{Message, PromptMessage};

/// Sends a chat history to the model under one mode's system prompt.
///
/// The client knows nothing about documents or sessions: it takes the
/// history it is given, prepends the system prompt, and returns whatever text
/// the provider produces. Provider errors are returned untouched.
pub struct AssistantClient<'a, P> {
    provider: &'a P,
    mode: Mode,
}

impl<'a, P: LlmProvider> AssistantClient<'a, P> {
    pub fn new(provider: &'a P, mode: Mode) -> Self {
        Self { provider, mode }
    }

    pub fn for_mode_name(provider: &'a P, name: Option<&str>) -> Self {
        Self::new(provider, Mode::resolve(name))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn system_prompt(&self) -> &'static str {
        self.mode.system_prompt()
    }

    pub fn build_request(&self, messages: &[Message]) -> AssistantInput {
        let mut outbound = Vec::with_capacity(messages.len() + 1);
        outbound.push(PromptMessage::system(self.system_prompt()));
        outbound.extend(messages.iter().map(PromptMessage::from));
        AssistantInput { messages: outbound }
    }

    pub async fn chat(&self, messages: &[Message]) -> LlmResult<String> {
        let output = self.provider.generate(self.build_request(messages)).await?;
        Ok(output.text)
    }
}
