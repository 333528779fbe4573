//! 测试用的脚本化日志后端
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log_lookup::llcommon::{AppError, Environment, RawLogRecord, Result};
use log_lookup::lookup::{BackendConnector, LogBackend, LogPage, SearchRequest};

/// 后端每次被请求时的返回
#[derive(Debug, Clone)]
pub enum Step {
    Page(Vec<&'static str>, Option<&'static str>),
    Fail(&'static str),
}

pub struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    requests: Arc<Mutex<Vec<(SearchRequest, Option<String>)>>>,
}

#[async_trait]
impl LogBackend for ScriptedBackend {
    async fn fetch_page(&self, request: &SearchRequest, next_token: Option<String>) -> Result<LogPage> {
        self.requests.lock().unwrap().push((request.clone(), next_token));
        match self.steps.lock().unwrap().pop_front() {
            Some(Step::Page(messages, next)) => Ok(LogPage {
                records: messages.into_iter().map(RawLogRecord::new).collect(),
                next_token: next.map(str::to_string),
            }),
            Some(Step::Fail(reason)) => Err(AppError::BackendError(reason.to_string())),
            None => Ok(LogPage::default()),
        }
    }
}

/// 每次连接都按同一脚本创建新的后端
pub struct ScriptedConnector {
    script: Vec<Step>,
    deny: Option<Environment>,
    connects: AtomicUsize,
    environments: Mutex<Vec<Environment>>,
    requests: Arc<Mutex<Vec<(SearchRequest, Option<String>)>>>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script,
            deny: None,
            connects: AtomicUsize::new(0),
            environments: Mutex::new(Vec::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// 该环境的凭证解析总是失败
    pub fn denying(script: Vec<Step>, env: Environment) -> Arc<Self> {
        Arc::new(Self {
            script,
            deny: Some(env),
            connects: AtomicUsize::new(0),
            environments: Mutex::new(Vec::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn environments(&self) -> Vec<Environment> {
        self.environments.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<(SearchRequest, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendConnector for ScriptedConnector {
    async fn connect(&self, env: Environment) -> Result<Arc<dyn LogBackend>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.environments.lock().unwrap().push(env);
        if self.deny == Some(env) {
            return Err(AppError::AuthError(format!("cannot assume role for {}", env)));
        }
        Ok(Arc::new(ScriptedBackend {
            steps: Mutex::new(self.script.iter().cloned().collect()),
            requests: self.requests.clone(),
        }))
    }
}
