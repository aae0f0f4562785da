/// 全局消息分页查询
#[derive(Debug, Clone)]
pub struct GetMessagesQuery {
    pub project_id: String,
    pub caller: Option<String>,
    pub limit: Option<usize>,
    /// 毫秒时间戳，只返回更早的消息
    pub before: Option<i64>,
}

/// 线程列表查询
#[derive(Debug, Clone)]
pub struct GetThreadsQuery {
    pub project_id: String,
    pub caller: Option<String>,
}
