use super::*;
use crate::domain::calendar::{AcademicCalendar, ValidityWindow};
use crate::domain::curriculum::{CurriculumReadModel, StudentCurricularPlan};
use crate::domain::degree_module::DegreeModuleType;
use crate::domain::error::DomainError;
use crate::domain::rule::{CurricularRuleKind, NewCurricularRule};
use crate::domain::types::{DegreeModuleId, ExecutionIntervalId, PlanId};
use chrono::NaiveDate;
use std::collections::BTreeSet;

// ==========================================
// 测试辅助函数
// ==========================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 两个学年 (各两个学期) 的日历
struct Fixture {
    calendar: AcademicCalendar,
    y1: ExecutionIntervalId,
    s11: ExecutionIntervalId,
    s12: ExecutionIntervalId,
    y2: ExecutionIntervalId,
    s21: ExecutionIntervalId,
}

fn fixture() -> Fixture {
    let mut calendar = AcademicCalendar::new();
    let y1 = calendar.add_year("2023/2024", date(2023, 9, 1), date(2024, 8, 31)).unwrap();
    let s11 = calendar.add_semester(y1, 1, date(2023, 9, 1), date(2024, 1, 31)).unwrap();
    let s12 = calendar.add_semester(y1, 2, date(2024, 2, 1), date(2024, 8, 31)).unwrap();
    let y2 = calendar.add_year("2024/2025", date(2024, 9, 1), date(2025, 8, 31)).unwrap();
    let s21 = calendar.add_semester(y2, 1, date(2024, 9, 1), date(2025, 1, 31)).unwrap();
    calendar.add_semester(y2, 2, date(2025, 2, 1), date(2025, 8, 31)).unwrap();
    Fixture {
        calendar,
        y1,
        s11,
        s12,
        y2,
        s21,
    }
}

fn plan() -> DegreeCurricularPlan {
    DegreeCurricularPlan::new(PlanId(1), "Licenciatura em Matemática", "LMAT")
}

fn attach(
    plan: &mut DegreeCurricularPlan,
    f: &Fixture,
    parent: DegreeModuleId,
    child: DegreeModuleId,
) -> crate::domain::error::DomainResult<crate::domain::types::ContextId> {
    let period = plan.periods_mut().semester(1, 1).unwrap();
    plan.add_context(&f.calendar, parent, child, period, ValidityWindow::open(f.s11), 0)
}

// ==========================================
// 上下文编写
// ==========================================

#[test]
fn test_duplicate_sibling_names_are_normalized() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let a = plan.add_curricular_course("Álgebra Linear", "AL", 6.0).unwrap();
    let b = plan.add_curricular_course("algebra  LINEAR", "AL2", 6.0).unwrap();

    attach(&mut plan, &f, root, a).unwrap();
    let err = attach(&mut plan, &f, root, b).unwrap_err();
    assert!(matches!(err, DomainError::DuplicateSiblingName { .. }));
}

#[test]
fn test_duplicate_names_in_detached_group_rejected() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let group = plan.add_course_group("Opções");
    let a = plan.add_curricular_course("Topologia", "T1", 6.0).unwrap();
    let b = plan.add_curricular_course("Topologia", "T2", 6.0).unwrap();

    attach(&mut plan, &f, group, a).unwrap();
    assert!(attach(&mut plan, &f, group, b).is_err());
    attach(&mut plan, &f, root, group).unwrap();
}

#[test]
fn test_overlapping_context_for_same_pair_rejected() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let course = plan.add_curricular_course("Análise I", "AN1", 6.0).unwrap();
    let period = plan.periods_mut().semester(1, 1).unwrap();

    plan.add_context(&f.calendar, root, course, period, ValidityWindow::new(f.s11, Some(f.s12)), 0)
        .unwrap();
    let err = plan
        .add_context(&f.calendar, root, course, period, ValidityWindow::open(f.s12), 0)
        .unwrap_err();
    assert!(matches!(err, DomainError::OverlappingContext { .. }));

    // 不重叠的后续上下文允许
    plan.add_context(&f.calendar, root, course, period, ValidityWindow::open(f.s21), 0)
        .unwrap();
}

#[test]
fn test_context_outside_parent_window_rejected() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let group = plan.add_course_group("Tronco Comum");
    let course = plan.add_curricular_course("Análise I", "AN1", 6.0).unwrap();
    let period = plan.periods_mut().semester(1, 1).unwrap();

    plan.add_context(&f.calendar, root, group, period, ValidityWindow::new(f.s12, Some(f.s21)), 0)
        .unwrap();
    let err = plan
        .add_context(&f.calendar, group, course, period, ValidityWindow::open(f.s12), 0)
        .unwrap_err();
    assert!(matches!(err, DomainError::ContextOutsideParentWindow(_)));

    plan.add_context(&f.calendar, group, course, period, ValidityWindow::new(f.s12, Some(f.s12)), 0)
        .unwrap();
}

#[test]
fn test_cycle_rejected() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let outer = plan.add_course_group("Externo");
    let inner = plan.add_course_group("Interno");
    attach(&mut plan, &f, root, outer).unwrap();
    attach(&mut plan, &f, outer, inner).unwrap();

    let err = attach(&mut plan, &f, inner, outer).unwrap_err();
    assert!(matches!(err, DomainError::CyclicStructure { .. }));
}

#[test]
fn test_mismatched_plan_reference_rejected() {
    let f = fixture();
    let mut plan = plan();
    let mut other = DegreeCurricularPlan::new(PlanId(2), "Outro", "OUT");
    let foreign = other.add_curricular_course("Física", "FIS", 6.0).unwrap();

    let root = plan.root();
    let err = attach(&mut plan, &f, root, foreign).unwrap_err();
    assert!(matches!(err, DomainError::MismatchedPlan { .. }));

    let rule = NewCurricularRule::new(
        root,
        ValidityWindow::open(f.s11),
        CurricularRuleKind::DegreeModuleSetApproval {
            required_modules: BTreeSet::from([foreign]),
            approval_group: None,
            show_warning: false,
        },
    );
    assert!(matches!(
        plan.add_curricular_rule(&f.calendar, rule),
        Err(DomainError::MismatchedPlan { .. })
    ));
}

// ==========================================
// 删除
// ==========================================

#[test]
fn test_delete_context_referenced_by_rule_rejected() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let group = plan.add_course_group("Opções");
    let ctx = attach(&mut plan, &f, root, group).unwrap();
    plan.add_curricular_rule(
        &f.calendar,
        NewCurricularRule::new(
            group,
            ValidityWindow::open(f.s11),
            CurricularRuleKind::CreditsLimit {
                min_credits: 6.0,
                max_credits: 12.0,
            },
        )
        .with_context(ctx),
    )
    .unwrap();

    assert!(matches!(
        plan.delete_context(ctx),
        Err(DomainError::ContextReferencedByRule { .. })
    ));
}

#[test]
fn test_delete_degree_module_blocked_by_curriculum() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let course = plan.add_curricular_course("Análise I", "AN1", 6.0).unwrap();
    let spare = plan.add_curricular_course("Análise II", "AN2", 6.0).unwrap();
    attach(&mut plan, &f, root, course).unwrap();
    attach(&mut plan, &f, root, spare).unwrap();

    let mut student = StudentCurricularPlan::new("A1", &plan);
    let group = student.root_group();
    student.enrol(group, course, 6.0, f.s11).unwrap();

    let curricula: [&dyn CurriculumReadModel; 1] = [&student];
    assert!(matches!(
        plan.delete_degree_module(course, &curricula),
        Err(DomainError::ModuleReferencedByCurriculum(_))
    ));
    assert!(matches!(
        plan.delete_degree_module(root, &curricula),
        Err(DomainError::CannotDeleteRoot(_))
    ));

    plan.delete_degree_module(spare, &curricula).unwrap();
    assert!(plan.module(spare).is_none());
    assert!(plan.parent_contexts(spare).is_empty());
}

// ==========================================
// 查询
// ==========================================

#[test]
fn test_valid_child_contexts_respect_windows() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let old = plan.add_curricular_course("Programação", "P1", 6.0).unwrap();
    let new = plan.add_curricular_course("Programação Funcional", "P2", 6.0).unwrap();
    let period = plan.periods_mut().semester(1, 1).unwrap();
    plan.add_context(&f.calendar, root, old, period, ValidityWindow::new(f.s11, Some(f.s12)), 0)
        .unwrap();
    plan.add_context(&f.calendar, root, new, period, ValidityWindow::open(f.s21), 1)
        .unwrap();

    let first_year: Vec<_> = plan
        .valid_child_contexts(&f.calendar, root, f.s11)
        .iter()
        .map(|ctx| ctx.child)
        .collect();
    assert_eq!(first_year, vec![old]);

    let second_year: Vec<_> = plan
        .valid_child_contexts_for_execution_aggregation(&f.calendar, root, f.y2)
        .iter()
        .map(|ctx| ctx.child)
        .collect();
    assert_eq!(second_year, vec![new]);
}

#[test]
fn test_collect_all_child_degree_modules_depth_first() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let group = plan.add_course_group("Bloco");
    let a = plan.add_curricular_course("A", "A", 6.0).unwrap();
    let b = plan.add_curricular_course("B", "B", 6.0).unwrap();
    attach(&mut plan, &f, root, group).unwrap();
    attach(&mut plan, &f, group, a).unwrap();
    attach(&mut plan, &f, root, b).unwrap();

    let courses = plan.collect_all_child_degree_modules(
        &f.calendar,
        root,
        Some(DegreeModuleType::CurricularCourse),
        f.y1,
    );
    assert_eq!(courses.len(), 2);
    assert!(courses.contains(&a) && courses.contains(&b));

    let groups = plan.collect_all_child_degree_modules(
        &f.calendar,
        root,
        Some(DegreeModuleType::CourseGroup),
        f.y1,
    );
    assert_eq!(groups, vec![group]);
}

#[test]
fn test_path_to_module_and_ects_functions() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let group = plan.add_course_group("Bloco");
    let a = plan.add_curricular_course("A", "A", 6.0).unwrap();
    let b = plan.add_curricular_course("B", "B", 7.5).unwrap();
    attach(&mut plan, &f, root, group).unwrap();
    attach(&mut plan, &f, group, a).unwrap();
    attach(&mut plan, &f, group, b).unwrap();

    let path = plan.path_to_module(&f.calendar, a, f.s11).unwrap();
    assert_eq!(path.target(), Some(a));
    assert_eq!(path.ancestors().len(), 2);
    assert_eq!(path.ancestors()[0], (root, None));

    assert_eq!(plan.min_ects_credits(&f.calendar, group, f.s11), 13.5);
    plan.add_curricular_rule(
        &f.calendar,
        NewCurricularRule::new(
            group,
            ValidityWindow::open(f.s11),
            CurricularRuleKind::CreditsLimit {
                min_credits: 6.0,
                max_credits: 12.0,
            },
        ),
    )
    .unwrap();
    assert_eq!(plan.min_ects_credits(&f.calendar, group, f.s11), 6.0);
    assert_eq!(plan.max_ects_credits(&f.calendar, group, f.s11), 12.0);
}

// ==========================================
// 规则集
// ==========================================

#[test]
fn test_latest_rule_supersedes_within_same_scope() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let old = plan
        .add_curricular_rule(
            &f.calendar,
            NewCurricularRule::new(
                root,
                ValidityWindow::open(f.s11),
                CurricularRuleKind::CreditsLimit {
                    min_credits: 30.0,
                    max_credits: 30.0,
                },
            ),
        )
        .unwrap();
    let new = plan
        .add_curricular_rule(
            &f.calendar,
            NewCurricularRule::new(
                root,
                ValidityWindow::open(f.s21),
                CurricularRuleKind::CreditsLimit {
                    min_credits: 36.0,
                    max_credits: 36.0,
                },
            ),
        )
        .unwrap();

    let first: Vec<_> = plan.curricular_rules(&f.calendar, root, None, f.s12).iter().map(|r| r.id).collect();
    assert_eq!(first, vec![old]);
    let second: Vec<_> = plan.curricular_rules(&f.calendar, root, None, f.s21).iter().map(|r| r.id).collect();
    assert_eq!(second, vec![new]);
}

#[test]
fn test_context_scoped_rule_only_applies_through_context() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let group = plan.add_course_group("Opções");
    let ctx = attach(&mut plan, &f, root, group).unwrap();
    plan.add_curricular_rule(
        &f.calendar,
        NewCurricularRule::new(
            group,
            ValidityWindow::open(f.s11),
            CurricularRuleKind::DegreeModulesSelectionLimit {
                min_modules: 1,
                max_modules: 2,
            },
        )
        .with_context_course_group(root),
    )
    .unwrap();

    assert_eq!(plan.curricular_rules(&f.calendar, group, Some(ctx), f.s11).len(), 1);
    assert!(plan.curricular_rules(&f.calendar, group, None, f.s11).is_empty());
}

#[test]
fn test_rule_configuration_rejected_at_creation() {
    let f = fixture();
    let mut plan = plan();
    let course = plan.add_curricular_course("A", "A", 6.0).unwrap();

    let on_course = NewCurricularRule::new(
        course,
        ValidityWindow::open(f.s11),
        CurricularRuleKind::CreditsLimit {
            min_credits: 0.0,
            max_credits: 6.0,
        },
    );
    assert!(matches!(
        plan.add_curricular_rule(&f.calendar, on_course),
        Err(DomainError::RuleRequiresCourseGroup { .. })
    ));

    let inverted = NewCurricularRule::new(
        plan.root(),
        ValidityWindow::open(f.s11),
        CurricularRuleKind::DegreeModulesSelectionLimit {
            min_modules: 5,
            max_modules: 2,
        },
    );
    assert!(matches!(
        plan.add_curricular_rule(&f.calendar, inverted),
        Err(DomainError::InconsistentLimits { .. })
    ));
}

#[test]
fn test_set_limits_visible_immediately() {
    let f = fixture();
    let mut plan = plan();
    let root = plan.root();
    let rule = plan
        .add_curricular_rule(
            &f.calendar,
            NewCurricularRule::new(
                root,
                ValidityWindow::open(f.s11),
                CurricularRuleKind::DegreeModulesSelectionLimit {
                    min_modules: 2,
                    max_modules: 4,
                },
            ),
        )
        .unwrap();

    plan.set_maximum_limit(rule, 3.0).unwrap();
    plan.set_minimum_limit(rule, 3.0).unwrap();
    assert!(matches!(
        plan.rule(rule).map(|r| &r.kind),
        Some(CurricularRuleKind::DegreeModulesSelectionLimit {
            min_modules: 3,
            max_modules: 3
        })
    ));

    assert!(matches!(
        plan.set_minimum_limit(rule, 4.0),
        Err(DomainError::InconsistentLimits { .. })
    ));
    assert!(matches!(
        plan.set_maximum_limit(rule, 3.5),
        Err(DomainError::FractionalModuleLimit(_))
    ));

    // 超出 u32 范围的上限被拒绝, 原值保留
    assert!(matches!(
        plan.set_maximum_limit(rule, 5e9),
        Err(DomainError::ModuleLimitOutOfRange(_))
    ));
    assert!(matches!(
        plan.rule(rule).map(|r| &r.kind),
        Some(CurricularRuleKind::DegreeModulesSelectionLimit {
            min_modules: 3,
            max_modules: 3
        })
    ));
}
