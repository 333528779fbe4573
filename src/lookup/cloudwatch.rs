//! CloudWatch Logs 后端
//!
//! 基础身份来自共享凭证文件中的 profile；demo/prod 等环境按角色表换取临时身份。
//! 每个环境的凭证提供者和客户端在启动时创建一次，之后所有请求复用

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::Client;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use crate::llcommon::{AppError, BackendConfig, Environment, RawLogRecord, Result};
use crate::lookup::source::{BackendConnector, LogBackend, LogPage, SearchRequest};

/// 距离过期不足该时长的凭证视为需要刷新
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// 单个环境的会话：凭证提供者、客户端和最近一次确认可用的凭证
struct EnvironmentSession {
    provider: SharedCredentialsProvider,
    client: Client,
    verified: Mutex<Option<Credentials>>,
}

impl EnvironmentSession {
    fn new(base: &SdkConfig, provider: SharedCredentialsProvider) -> Self {
        let conf = aws_sdk_cloudwatchlogs::config::Builder::from(base)
            .credentials_provider(provider.clone())
            .build();
        Self {
            provider,
            client: Client::from_conf(conf),
            verified: Mutex::new(None),
        }
    }

    /// 确认凭证可用；未临近过期的凭证直接复用，不会再次请求 STS
    async fn verify(&self, env: Environment) -> Result<()> {
        let mut verified = self.verified.lock().await;
        if verified.as_ref().is_some_and(is_fresh) {
            return Ok(());
        }

        match self.provider.provide_credentials().await {
            Ok(credentials) => {
                debug!(target: "source", env = %env, expiry = ?credentials.expiry(), "凭证已刷新");
                *verified = Some(credentials);
                Ok(())
            }
            Err(e) => {
                *verified = None;
                let auth_error = AppError::AuthError(format!("环境 {} 的凭证解析失败: {}", env, DisplayErrorContext(&e)));
                error!(
                    target: "source",
                    message = "凭证解析失败",
                    env = %env,
                    error.summary = auth_error.get_error_type_summary(),
                    error.details = %auth_error
                );
                Err(auth_error)
            }
        }
    }
}

fn is_fresh(credentials: &Credentials) -> bool {
    match credentials.expiry() {
        Some(expiry) => expiry > SystemTime::now() + REFRESH_MARGIN,
        None => true,
    }
}

/// 按环境建立 CloudWatch Logs 客户端
///
/// 进程启动时创建一次，之后只读，可被并发请求共享
pub struct CloudWatchConnector {
    sessions: HashMap<Environment, EnvironmentSession>,
}

impl CloudWatchConnector {
    /// 加载基础身份，并为每个环境准备凭证提供者
    #[instrument(skip_all, fields(profile = %config.profile, region = %config.region))]
    pub async fn from_config(config: &BackendConfig) -> Result<Self> {
        let base = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(&config.profile)
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut providers = Vec::new();
        for env in Environment::ALL {
            let provider = match config.role_for(env) {
                Some(role_arn) => {
                    info!(target: "source", env = %env, role = %role_arn, "环境使用角色身份");
                    let provider = AssumeRoleProvider::builder(role_arn)
                        .session_name(config.session_name.clone())
                        .configure(&base)
                        .build()
                        .await;
                    SharedCredentialsProvider::new(provider)
                }
                None => match base.credentials_provider() {
                    Some(provider) => provider,
                    None => continue,
                },
            };
            providers.push((env, provider));
        }

        let connector = Self::with_providers(&base, providers);
        info!(target: "source", environments = connector.sessions.len(), "CloudWatch 连接器初始化完成");
        Ok(connector)
    }

    /// 用给定的凭证提供者建立各环境的会话
    pub fn with_providers(
        base: &SdkConfig,
        providers: impl IntoIterator<Item = (Environment, SharedCredentialsProvider)>,
    ) -> Self {
        let sessions = providers
            .into_iter()
            .map(|(env, provider)| (env, EnvironmentSession::new(base, provider)))
            .collect();
        Self { sessions }
    }
}

#[async_trait]
impl BackendConnector for CloudWatchConnector {
    async fn connect(&self, env: Environment) -> Result<Arc<dyn LogBackend>> {
        let session = self
            .sessions
            .get(&env)
            .ok_or_else(|| AppError::AuthError(format!("环境 {} 没有可用的凭证提供者", env)))?;

        // 提前确认凭证，把认证问题和查询问题区分开
        session.verify(env).await?;
        Ok(Arc::new(CloudWatchBackend { client: session.client.clone() }))
    }
}

/// 调用 FilterLogEvents 的后端
pub struct CloudWatchBackend {
    client: Client,
}

#[async_trait]
impl LogBackend for CloudWatchBackend {
    async fn fetch_page(&self, request: &SearchRequest, next_token: Option<String>) -> Result<LogPage> {
        let output = self
            .client
            .filter_log_events()
            .log_group_name(&request.log_group_name)
            .filter_pattern(&request.filter_pattern)
            .start_time(request.start_time)
            .end_time(request.end_time)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| AppError::BackendError(format!("FilterLogEvents 失败: {}", DisplayErrorContext(&e))))?;

        let records: Vec<RawLogRecord> = output
            .events()
            .iter()
            .filter_map(|event| event.message())
            .map(RawLogRecord::new)
            .collect();
        debug!(target: "source", records = records.len(), "FilterLogEvents 返回");

        Ok(LogPage {
            records,
            next_token: output.next_token().map(str::to_string),
        })
    }
}
