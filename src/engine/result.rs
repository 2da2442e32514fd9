// ==========================================
// 学籍课程规则引擎 - 规则评估结果
// ==========================================
// 真值: TRUE / FALSE / UNKNOWN (Kleene 三值逻辑)
// 严重度: SUCCESS < WARNING < FAIL (独立于真值)
// 组合:
// - and: 真值取 Kleene 与, 严重度取最大, 消息全部保留 (不短路)
// - or: 真值取 Kleene 或, 严重度取最小, 仅保留成立分支的消息
// ==========================================

use crate::domain::types::DegreeModuleId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleValue {
    True,
    False,
    Unknown,
}

impl RuleValue {
    pub fn and(self, other: RuleValue) -> RuleValue {
        match (self, other) {
            (RuleValue::False, _) | (_, RuleValue::False) => RuleValue::False,
            (RuleValue::True, RuleValue::True) => RuleValue::True,
            _ => RuleValue::Unknown,
        }
    }

    pub fn or(self, other: RuleValue) -> RuleValue {
        match (self, other) {
            (RuleValue::True, _) | (_, RuleValue::True) => RuleValue::True,
            (RuleValue::False, RuleValue::False) => RuleValue::False,
            _ => RuleValue::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Success,
    Warning,
    Fail,
}

/// 可本地化的结果消息 (键 + 位置参数)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResultMessage {
    pub key: String,
    pub args: Vec<String>,
    /// 消息关联的学位模块
    pub degree_module: Option<DegreeModuleId>,
    /// false 表示 key 本身即为展示文本
    pub to_translate: bool,
}

impl RuleResultMessage {
    pub fn new(key: &str, args: Vec<String>) -> Self {
        Self {
            key: key.to_string(),
            args,
            degree_module: None,
            to_translate: true,
        }
    }

    pub fn for_module(mut self, module: DegreeModuleId) -> Self {
        self.degree_module = Some(module);
        self
    }

    pub fn for_optional_module(mut self, module: Option<DegreeModuleId>) -> Self {
        self.degree_module = module;
        self
    }

    /// 直接展示的文本, 不经本地化
    pub fn literal(text: &str) -> Self {
        Self {
            key: text.to_string(),
            args: Vec::new(),
            degree_module: None,
            to_translate: false,
        }
    }
}

// ==========================================
// RuleResult - 评估结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub value: RuleValue,
    pub severity: Severity,
    pub messages: Vec<RuleResultMessage>,
}

impl RuleResult {
    pub fn success() -> Self {
        Self {
            value: RuleValue::True,
            severity: Severity::Success,
            messages: Vec::new(),
        }
    }

    pub fn failure(message: RuleResultMessage) -> Self {
        Self {
            value: RuleValue::False,
            severity: Severity::Fail,
            messages: vec![message],
        }
    }

    /// 警告: 真值由调用方给定 (结业判定为 FALSE, 可结业判定为 TRUE)
    pub fn warning(value: RuleValue, message: RuleResultMessage) -> Self {
        Self {
            value,
            severity: Severity::Warning,
            messages: vec![message],
        }
    }

    pub fn unknown(message: RuleResultMessage) -> Self {
        Self {
            value: RuleValue::Unknown,
            severity: Severity::Warning,
            messages: vec![message],
        }
    }

    pub fn is_true(&self) -> bool {
        self.value == RuleValue::True
    }

    pub fn is_false(&self) -> bool {
        self.value == RuleValue::False
    }

    pub fn is_fail(&self) -> bool {
        self.severity == Severity::Fail
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// 与组合 (不短路, 全部消息保留)
    pub fn and(mut self, other: RuleResult) -> RuleResult {
        self.value = self.value.and(other.value);
        self.severity = self.severity.max(other.severity);
        self.messages.extend(other.messages);
        self
    }

    /// 或组合 (任一成立即成立)
    pub fn or(self, other: RuleResult) -> RuleResult {
        let value = self.value.or(other.value);
        let severity = self.severity.min(other.severity);
        let messages = if value == RuleValue::True {
            [self, other]
                .into_iter()
                .filter(|result| result.is_true())
                .flat_map(|result| result.messages)
                .collect()
        } else {
            let mut messages = self.messages;
            messages.extend(other.messages);
            messages
        };
        RuleResult {
            value,
            severity,
            messages,
        }
    }

    /// 多个结果的与组合 (空集合为成功)
    pub fn and_all(results: impl IntoIterator<Item = RuleResult>) -> RuleResult {
        results
            .into_iter()
            .fold(RuleResult::success(), |acc, result| acc.and(result))
    }

    /// 多个结果的或组合 (空集合为成功)
    pub fn or_all(results: impl IntoIterator<Item = RuleResult>) -> RuleResult {
        results
            .into_iter()
            .reduce(|acc, result| acc.or(result))
            .unwrap_or_else(RuleResult::success)
    }
}
