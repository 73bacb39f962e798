// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use crate::engines::traits::BrowserSession;

/// 渐进滚动的步数上限，防止超长页面拖死单页处理
const MAX_SCROLL_STEPS: u32 = 50;

/// 模拟人工渐进滚动到页底再回到页顶
///
/// 触发懒加载的商品栅格，同时放缓请求节奏。
/// 任何脚本失败都只中断滚动，不影响调用方。
pub async fn human_scroll<S: BrowserSession + ?Sized>(session: &S) {
    let total = match session.evaluate("document.body.scrollHeight").await {
        Ok(value) => value.as_f64().unwrap_or(0.0),
        Err(e) => {
            tracing::debug!(error = %e, "scroll height unavailable, skipping scroll");
            return;
        }
    };

    let mut position = 0.0;
    let mut steps = 0u32;
    while position < total && steps < MAX_SCROLL_STEPS {
        position += rand::random_range(100.0..300.0);
        let script = format!("window.scrollTo(0, {});", position as u64);
        if session.evaluate(&script).await.is_err() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(rand::random_range(100..300))).await;
        steps += 1;
    }

    let _ = session.evaluate("window.scrollTo(0, 0);").await;
}

/// 两次请求之间的随机暂停
///
/// 上限为0时直接返回，测试用零节奏配置走此路径。
pub async fn pause_between(min_ms: u64, max_ms: u64) {
    if max_ms == 0 {
        return;
    }
    let ms = if min_ms >= max_ms {
        min_ms
    } else {
        rand::random_range(min_ms..=max_ms)
    };
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
