//! 节点注册表
//!
//! 宿主按类名查找节点实现、按显示名渲染菜单。两张表都是静态配置数据，
//! 这里合并为一张 `NODE_REGISTRY`。

use serde::Serialize;

/// 单个节点的注册信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeSpec {
    /// 宿主内唯一类名。
    pub class_name: &'static str,
    /// 菜单显示名。
    pub display_name: &'static str,
    /// 菜单分类。
    pub category: &'static str,
    /// 是否为输出节点（无下游也会执行）。
    pub output_node: bool,
}

pub static NODE_REGISTRY: &[NodeSpec] = &[
    NodeSpec {
        class_name: "EZHttpPostNode",
        display_name: "HTTP POST",
        category: "HTTP",
        output_node: true,
    },
    NodeSpec {
        class_name: "EZEmptyDictNode",
        display_name: "Empty Dict",
        category: "DICT",
        output_node: false,
    },
    NodeSpec {
        class_name: "EZAssocStrNode",
        display_name: "Assoc Str",
        category: "DICT",
        output_node: false,
    },
    NodeSpec {
        class_name: "EZAssocDictNode",
        display_name: "Assoc Dict",
        category: "DICT",
        output_node: false,
    },
    NodeSpec {
        class_name: "EZAssocImgNode",
        display_name: "Assoc Img",
        category: "DICT",
        output_node: false,
    },
    NodeSpec {
        class_name: "EZLoadImgFromUrlNode",
        display_name: "Load Img From URL (EZ)",
        category: "HTTP",
        output_node: false,
    },
    NodeSpec {
        class_name: "EZLoadImgBatchFromUrlsNode",
        display_name: "Load Img Batch From URLs (EZ)",
        category: "HTTP",
        output_node: false,
    },
    NodeSpec {
        class_name: "EZS3Uploader",
        display_name: "S3 Upload (EZ)",
        category: "Video",
        output_node: true,
    },
    NodeSpec {
        class_name: "EZRemoveImgBackground",
        display_name: "Remove Img Background (EZ)",
        category: "image",
        output_node: true,
    },
];

/// 按类名查找。
pub fn find_node(class_name: &str) -> Option<&'static NodeSpec> {
    NODE_REGISTRY.iter().find(|spec| spec.class_name == class_name)
}
