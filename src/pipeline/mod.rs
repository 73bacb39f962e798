// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 管线模块
///
/// 商品发现与提取管线的全部组件：
/// - Cookie同意处理（consent）
/// - 列表页翻页器（paginator）
/// - 商品页提取器（extractor）
/// - 节奏控制（pacing）
/// - 运行器（runner）
pub mod consent;
pub mod extractor;
pub mod pacing;
pub mod paginator;
pub mod runner;
