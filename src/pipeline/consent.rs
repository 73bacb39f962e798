// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use crate::engines::traits::BrowserSession;
use crate::infrastructure::storage::OutputStore;

/// Cookie同意按钮的定位策略
///
/// 按特异性降序排列，先命中先用。
#[derive(Debug, Clone, Copy)]
pub enum ConsentLocator {
    /// CSS选择器定位
    Css(&'static str),
    /// 按钮文本包含匹配（不区分大小写）
    ButtonText(&'static str),
}

/// 定位策略表，OneTrust横幅的已知形态优先
pub const CONSENT_LOCATORS: [ConsentLocator; 7] = [
    ConsentLocator::Css("#onetrust-accept-btn-handler"),
    ConsentLocator::Css("#onetrust-button-group #onetrust-accept-btn-handler"),
    ConsentLocator::Css(".ot-sdk-container button#onetrust-accept-btn-handler"),
    ConsentLocator::ButtonText("tout accepter"),
    ConsentLocator::ButtonText("accepter"),
    ConsentLocator::ButtonText("j'accepte"),
    ConsentLocator::Css(".ot-sdk-container .ot-sdk-row button"),
];

/// 尝试关闭Cookie同意浮层
///
/// 逐策略做有界等待，首个可点击的命中即滚动到视区并点击。
/// 全部落空时尽力转储页面标记供线下维护选择器，但从不让调用方失败。
///
/// # 返回值
///
/// 实际发出过点击动作时返回 `true`
pub async fn dismiss_consent<S: BrowserSession + ?Sized>(
    session: &S,
    timeout: Duration,
    debug: Option<&OutputStore>,
) -> bool {
    for locator in CONSENT_LOCATORS {
        match locator {
            ConsentLocator::Css(selector) => match session.click(selector, timeout).await {
                Ok(true) => {
                    tracing::info!(selector, "consent overlay dismissed");
                    return true;
                }
                Ok(false) => {
                    tracing::debug!(selector, "consent button not clickable within wait");
                }
                Err(e) => {
                    tracing::debug!(selector, error = %e, "consent click attempt failed");
                }
            },
            ConsentLocator::ButtonText(phrase) => {
                match session.evaluate(&button_text_script(phrase)).await {
                    Ok(serde_json::Value::Bool(true)) => {
                        tracing::info!(phrase, "consent overlay dismissed via button text");
                        return true;
                    }
                    Ok(_) => {
                        tracing::debug!(phrase, "no button with matching text");
                    }
                    Err(e) => {
                        tracing::debug!(phrase, error = %e, "consent text probe failed");
                    }
                }
            }
        }
    }

    if let Some(store) = debug {
        if let Ok(html) = session.page_content().await {
            store.dump_markup("cookies_debug.html", &html).await;
        }
    }
    tracing::warn!("no consent locator strategy matched, proceeding anyway");
    false
}

fn button_text_script(phrase: &str) -> String {
    format!(
        r#"(() => {{
    const needle = {phrase:?};
    for (const button of document.querySelectorAll('button')) {{
        const text = (button.textContent || '').trim().toLowerCase();
        if (text.includes(needle)) {{
            button.scrollIntoView({{block: 'center'}});
            button.click();
            return true;
        }}
    }}
    return false;
}})()"#
    )
}
