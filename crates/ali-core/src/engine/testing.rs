//! Judge doubles for engine tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::judge::{Judge, JudgeOptions};

type Responder = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Answers from a closure over the user prompt, or from a fixed script
pub struct ScriptedJudge {
    responder: Option<Responder>,
    script: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedJudge {
    pub fn by_prompt(responder: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            responder: Some(Box::new(responder)),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn constant(answer: &str) -> Self {
        let answer = answer.to_string();
        Self::by_prompt(move |_| answer.clone())
    }

    /// Replies in order; an exhausted script answers with empty text
    pub fn sequence(answers: &[&str]) -> Self {
        Self {
            responder: None,
            script: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn ask(&self, _system: &str, user: &str, _options: &JudgeOptions) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.responder {
            Some(responder) => responder(user),
            None => self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default(),
        }
    }
}
