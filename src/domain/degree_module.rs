// ==========================================
// 学籍课程规则引擎 - 学位模块与上下文
// ==========================================
// 职责: 课程组 / 课程节点, 以及带有效期的父子边 (Context)
// 红线: 同一父课程组下, 同一子模块在任一执行期至多一条有效上下文
// ==========================================

use crate::domain::calendar::ValidityWindow;
use crate::domain::types::{ContextId, CurricularPeriodId, DegreeModuleId};
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// 结业检查点标记 (如 "学士学位结业")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramConclusion {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DegreeModuleKind {
    CourseGroup {
        program_conclusion: Option<ProgramConclusion>,
    },
    CurricularCourse {
        code: String,
        ects_credits: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DegreeModuleType {
    CourseGroup,
    CurricularCourse,
}

// ==========================================
// DegreeModule - 学位模块
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeModule {
    pub id: DegreeModuleId,
    pub name: String,
    pub kind: DegreeModuleKind,
}

impl DegreeModule {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, DegreeModuleKind::CurricularCourse { .. })
    }

    pub fn is_course_group(&self) -> bool {
        !self.is_leaf()
    }

    pub fn module_type(&self) -> DegreeModuleType {
        match self.kind {
            DegreeModuleKind::CourseGroup { .. } => DegreeModuleType::CourseGroup,
            DegreeModuleKind::CurricularCourse { .. } => DegreeModuleType::CurricularCourse,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match &self.kind {
            DegreeModuleKind::CurricularCourse { code, .. } => Some(code),
            DegreeModuleKind::CourseGroup { .. } => None,
        }
    }

    /// 课程自身学分 (课程组的学分由规则或子模块推导)
    pub fn course_ects_credits(&self) -> Option<f64> {
        match &self.kind {
            DegreeModuleKind::CurricularCourse { ects_credits, .. } => Some(*ects_credits),
            DegreeModuleKind::CourseGroup { .. } => None,
        }
    }

    pub fn program_conclusion(&self) -> Option<&ProgramConclusion> {
        match &self.kind {
            DegreeModuleKind::CourseGroup { program_conclusion } => program_conclusion.as_ref(),
            DegreeModuleKind::CurricularCourse { .. } => None,
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// 名称结构化规范: 去除变音符号、忽略大小写、合并空白
pub fn normalize_name(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ==========================================
// Context - 带有效期的父子边
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub id: ContextId,
    pub parent: DegreeModuleId, // 父课程组
    pub child: DegreeModuleId,
    pub curricular_period: CurricularPeriodId,
    pub window: ValidityWindow,
    pub child_order: u32,
}
