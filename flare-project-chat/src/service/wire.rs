//! Wire 风格的依赖注入模块
//!
//! 按依赖顺序构建仓储、领域服务、处理器与 HTTP 路由

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use flare_collab_core::config::FlareAppConfig;
use flare_collab_core::hooks::adapters::DefaultHookFactory;
use flare_collab_core::hooks::{HookConfigLoader, HookDispatcher, HookRegistry};
use tracing::info;

use crate::application::handlers::{ChatCommandHandler, ChatQueryHandler};
use crate::config::ProjectChatConfig;
use crate::domain::model::AuthorizationPolicy;
use crate::domain::repository::{ChatRepositoryRef, IdentityResolverRef, RoomBroadcasterRef};
use crate::domain::service::ChatDomainService;
use crate::infrastructure::broadcast::{InProcessRoomBroadcaster, RedisRoomBroadcaster};
use crate::infrastructure::hooks::{CHAT_AUDIT_HOOK, ChatAuditHook};
use crate::infrastructure::identity::{HttpIdentityResolver, StaticIdentityResolver};
use crate::infrastructure::persistence::{InMemoryChatRepository, PostgresChatRepository};
use crate::infrastructure::session::{CallerIdentityResolverRef, HeaderCallerIdentityResolver};
use crate::interface::{HttpState, router};

/// 应用上下文 - 包含所有已初始化的服务
pub struct ApplicationContext {
    pub router: Router,
    pub domain_service: Arc<ChatDomainService>,
}

/// 构建应用上下文
pub async fn initialize(app_config: &FlareAppConfig) -> Result<ApplicationContext> {
    // 1. 服务配置
    let chat_config = ProjectChatConfig::from_app_config(app_config)
        .context("Failed to load project chat service configuration")?;

    // 2. 消息仓储
    let repository: ChatRepositoryRef = match chat_config.message_store.as_ref() {
        Some(store) => {
            let repo = PostgresChatRepository::connect(store).await?;
            repo.ensure_schema().await?;
            info!("Using PostgreSQL chat repository");
            Arc::new(repo)
        }
        None => {
            info!("Message store not configured, using in-memory chat repository");
            Arc::new(InMemoryChatRepository::new())
        }
    };

    // 3. 用户信息
    let identity: IdentityResolverRef = match chat_config.identity_endpoint.as_deref() {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "Using HTTP identity resolver");
            Arc::new(HttpIdentityResolver::new(
                endpoint,
                chat_config.identity_timeout,
            )?)
        }
        None => {
            info!("Identity endpoint not configured, authors are rendered as placeholders");
            Arc::new(StaticIdentityResolver::default())
        }
    };

    // 4. 房间广播
    let broadcaster: RoomBroadcasterRef = match chat_config.room_bus_url.as_deref() {
        Some(url) => {
            let bus = RedisRoomBroadcaster::connect(url, chat_config.room_channel.clone()).await?;
            info!(channel = %chat_config.room_channel, "Using Redis room broadcaster");
            Arc::new(bus)
        }
        None => {
            info!("Room bus not configured, using in-process broadcaster");
            Arc::new(InProcessRoomBroadcaster::default())
        }
    };

    // 5. 提交后 Hook
    let hooks = build_hook_dispatcher(&chat_config).await?;

    // 6. 领域服务与处理器
    let domain_service = Arc::new(ChatDomainService::new(
        repository,
        identity,
        broadcaster,
        hooks,
        AuthorizationPolicy::default(),
        chat_config.domain,
    ));
    let command_handler = Arc::new(ChatCommandHandler::new(domain_service.clone()));
    let query_handler = Arc::new(ChatQueryHandler::new(domain_service.clone()));

    // 7. HTTP 路由
    let caller_resolver: CallerIdentityResolverRef =
        Arc::new(HeaderCallerIdentityResolver::new(&chat_config.caller_header));
    let router = router(HttpState::new(
        command_handler,
        query_handler,
        caller_resolver,
    ));

    Ok(ApplicationContext {
        router,
        domain_service,
    })
}

async fn build_hook_dispatcher(config: &ProjectChatConfig) -> Result<HookDispatcher> {
    // 显式配置的路径替换默认候选
    let loader = match (config.hook_config.as_deref(), config.hook_config_dir.as_deref()) {
        (None, None) => HookConfigLoader::new(),
        (file, dir) => file
            .into_iter()
            .chain(dir)
            .fold(HookConfigLoader::empty(), |loader, path| {
                loader.add_candidate(path)
            }),
    };
    let hook_config = loader.load().context("Failed to load hook configuration")?;

    let mut factory = DefaultHookFactory::new().context("Failed to build hook factory")?;
    factory.register_local(CHAT_AUDIT_HOOK, Arc::new(ChatAuditHook));

    let registry = HookRegistry::new();
    let installed = hook_config
        .install(registry.clone(), &factory)
        .await
        .context("Failed to install post-commit hooks")?;
    info!(installed, "Post-commit hooks installed");

    Ok(HookDispatcher::new(registry))
}
