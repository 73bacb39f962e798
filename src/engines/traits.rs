// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 会话错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    /// 导航失败
    #[error("navigation failed: {0}")]
    Navigation(String),
    /// 有界等待超时
    #[error("timed out waiting for {0}")]
    WaitTimeout(String),
    /// 页面脚本执行失败
    #[error("script evaluation failed: {0}")]
    Script(String),
    /// 浏览器级错误
    #[error("browser error: {0}")]
    Browser(String),
}

impl SessionError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 导航、等待超时和浏览器级的瞬时错误可重试；脚本错误不可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Navigation(_) => true,
            SessionError::WaitTimeout(_) => true,
            SessionError::Browser(_) => true,
            SessionError::Script(_) => false,
        }
    }
}

/// 浏览器会话特质
///
/// 管线对浏览器的全部依赖面。生产实现基于 chromiumoxide，
/// 测试实现基于固定HTML夹具。管线借用会话而不拥有它，
/// 会话生命周期由构造方管理。
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 导航到目标URL并等待页面加载完成
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// 当前页面渲染后的完整标记
    async fn page_content(&self) -> Result<String, SessionError>;

    /// 在页面上下文中执行脚本并返回其求值结果
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, SessionError>;

    /// 有界等待任一候选选择器出现
    ///
    /// # 返回值
    ///
    /// 首个命中的选择器；超时前全部未出现则返回 `None`（不是错误）
    async fn wait_for_any(
        &self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<Option<String>, SessionError>;

    /// 有界等待选择器的首个元素产生非空文本
    async fn first_text(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, SessionError>;

    /// 收集选择器全部命中元素的指定属性值
    async fn collect_attr(&self, selector: &str, attr: &str)
        -> Result<Vec<String>, SessionError>;

    /// 有界等待元素出现，滚动到视区中央并点击
    ///
    /// # 返回值
    ///
    /// 点击动作实际发生时返回 `true`
    async fn click(&self, selector: &str, timeout: Duration) -> Result<bool, SessionError>;
}
