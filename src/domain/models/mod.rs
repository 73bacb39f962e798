// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 商品记录（product）：单个商品页的提取结果与运行期集合
/// - 分类（category）：目标站点的目录板块
pub mod category;
pub mod product;
