// ==========================================
// 结业判定引擎集成测试
// ==========================================
// 测试目标: isConcluded / canConclude 在学分、数量、无规则课程组上的判定
// ==========================================


use curricular_engine::domain::{
    CurricularRuleKind, CurriculumReadModel, NewCurricularRule, NoCourseGroupType,
    ProgramConclusion, StudentCurricularPlan, ValidityWindow,
};
use curricular_engine::engine::{ConclusionEngine, RuleValue, Severity};
use curricular_engine::CurriculumGroupId;
use test_helpers::{add_rule, course, empty_plan, group, two_year_calendar};

// ==========================================
// 学分上下限
// ==========================================

#[test]
fn test_credits_limit_exact_and_pending() {
    curricular_engine::logging::init_test();
    let cal = two_year_calendar();
    let mut plan = empty_plan();
    let root = plan.root();
    let options = group(&mut plan, &cal, root, "Opções");
    let courses: Vec<_> = ["Álgebra", "Geometria", "Estatística", "Lógica"]
        .iter()
        .map(|name| course(&mut plan, &cal, options, name, 1, 1))
        .collect();
    add_rule(
        &mut plan,
        &cal,
        options,
        CurricularRuleKind::CreditsLimit {
            min_credits: 18.0,
            max_credits: 18.0,
        },
    );

    // 18 学分全部通过
    let mut student = StudentCurricularPlan::new("A1", &plan);
    let g = student.ensure_group_path(&[root, options]).unwrap();
    for module in &courses[..3] {
        let line = student.enrol(g, *module, 6.0, cal.s11).unwrap();
        student.approve(line).unwrap();
    }
    let engine = ConclusionEngine::new(&plan, &cal.calendar, &student);
    assert!(engine.is_concluded(g, cal.s11).is_true());
    assert_eq!(engine.approved_credits(g), 18.0);

    // 12 通过 + 6 已选
    let mut student = StudentCurricularPlan::new("A2", &plan);
    let g = student.ensure_group_path(&[root, options]).unwrap();
    for module in &courses[..2] {
        let line = student.enrol(g, *module, 6.0, cal.s11).unwrap();
        student.approve(line).unwrap();
    }
    let pending = student.enrol(g, courses[2], 6.0, cal.s11).unwrap();
    {
        let engine = ConclusionEngine::new(&plan, &cal.calendar, &student);
        let concluded = engine.is_concluded(g, cal.s11);
        assert!(concluded.is_false());
        assert_eq!(
            concluded.messages[0].key,
            "label.CreditsLimit.conclusion.minimum.not.reached"
        );
        assert!(engine.can_conclude(g, cal.s11).is_true());
    }

    // 已选课程未通过后不再可结业
    student.flunk(pending).unwrap();
    let engine = ConclusionEngine::new(&plan, &cal.calendar, &student);
    assert!(engine.can_conclude(g, cal.s11).is_false());
}

#[test]
fn test_credits_in_bucket_do_not_count() {
    let cal = two_year_calendar();
    let mut plan = empty_plan();
    let root = plan.root();
    let options = group(&mut plan, &cal, root, "Opções");
    let a = course(&mut plan, &cal, options, "Álgebra", 1, 1);
    let b = course(&mut plan, &cal, options, "Geometria", 1, 1);
    add_rule(
        &mut plan,
        &cal,
        options,
        CurricularRuleKind::CreditsLimit {
            min_credits: 12.0,
            max_credits: 12.0,
        },
    );

    let mut student = StudentCurricularPlan::new("A1", &plan);
    let g = student.ensure_group_path(&[root, options]).unwrap();
    let mut lines = Vec::new();
    for module in [a, b] {
        let line = student.enrol(g, module, 6.0, cal.s11).unwrap();
        student.approve(line).unwrap();
        lines.push(line);
    }
    assert!(ConclusionEngine::new(&plan, &cal.calendar, &student)
        .is_concluded(g, cal.s11)
        .is_true());

    let extra = student.ensure_no_course_group(NoCourseGroupType::ExtraCurricular);
    student.move_line(lines[1], extra).unwrap();
    let engine = ConclusionEngine::new(&plan, &cal.calendar, &student);
    assert!(engine.is_concluded(g, cal.s11).is_false());
    assert_eq!(engine.approved_credits(g), 6.0);
}

#[test]
fn test_credits_rule_scoped_to_grandparent_is_preferred() {
    let cal = two_year_calendar();
    let mut plan = empty_plan();
    let root = plan.root();
    let cycle = group(&mut plan, &cal, root, "Ciclo");
    let options = group(&mut plan, &cal, cycle, "Opções");
    let sibling = group(&mut plan, &cal, root, "Minor");
    let a = course(&mut plan, &cal, options, "Álgebra", 1, 1);
    course(&mut plan, &cal, options, "Geometria", 1, 1);
    add_rule(
        &mut plan,
        &cal,
        options,
        CurricularRuleKind::CreditsLimit {
            min_credits: 12.0,
            max_credits: 12.0,
        },
    );

    let mut student = StudentCurricularPlan::new("A1", &plan);
    let g = student.ensure_group_path(&[root, cycle, options]).unwrap();
    let line = student.enrol(g, a, 6.0, cal.s11).unwrap();
    student.approve(line).unwrap();

    // 上下文课程组不在祖先链上: 不参与择优
    let mut unrelated = plan.clone();
    unrelated
        .add_curricular_rule(
            &cal.calendar,
            NewCurricularRule::new(
                options,
                ValidityWindow::open(cal.s11),
                CurricularRuleKind::CreditsLimit {
                    min_credits: 6.0,
                    max_credits: 6.0,
                },
            )
            .with_context_course_group(sibling),
        )
        .unwrap();
    let engine = ConclusionEngine::new(&unrelated, &cal.calendar, &student);
    let result = engine.is_concluded(g, cal.s11);
    assert!(result.is_false());
    assert_eq!(
        result.messages[0].key,
        "label.CreditsLimit.conclusion.minimum.not.reached"
    );

    // 上下文课程组为祖父课程组: 优先于无范围规则
    plan.add_curricular_rule(
        &cal.calendar,
        NewCurricularRule::new(
            options,
            ValidityWindow::open(cal.s11),
            CurricularRuleKind::CreditsLimit {
                min_credits: 6.0,
                max_credits: 6.0,
            },
        )
        .with_context_course_group(root),
    )
    .unwrap();
    let engine = ConclusionEngine::new(&plan, &cal.calendar, &student);
    assert!(engine.is_concluded(g, cal.s11).is_true());
}

// ==========================================
// 数量规则与学分规则的差异
// ==========================================

/// 课程组下 5 个子课程组, 各含一门已通过课程
fn five_subgroups(
    kind: CurricularRuleKind,
    ruled_children: usize,
) -> (bool, RuleValue) {
    let cal = two_year_calendar();
    let mut plan = empty_plan();
    let root = plan.root();
    let block = group(&mut plan, &cal, root, "Bloco Livre");
    let mut pairs = Vec::new();
    for index in 1..=5 {
        let sub = group(&mut plan, &cal, block, &format!("Área {}", index));
        let leaf = course(&mut plan, &cal, sub, &format!("Seminário {}", index), 1, 1);
        if index <= ruled_children {
            add_rule(
                &mut plan,
                &cal,
                sub,
                CurricularRuleKind::CreditsLimit {
                    min_credits: 6.0,
                    max_credits: 6.0,
                },
            );
        }
        pairs.push((sub, leaf));
    }
    add_rule(&mut plan, &cal, block, kind);

    let mut student = StudentCurricularPlan::new("A1", &plan);
    let block_group = student.ensure_group_path(&[root, block]).unwrap();
    for (sub, leaf) in pairs {
        let g = student.ensure_group_path(&[root, block, sub]).unwrap();
        let line = student.enrol(g, leaf, 6.0, cal.s11).unwrap();
        student.approve(line).unwrap();
    }
    let engine = ConclusionEngine::new(&plan, &cal.calendar, &student);
    let result = engine.is_concluded(block_group, cal.s11);
    (result.is_true(), result.value)
}

#[test]
fn test_selection_limit_ignores_unruled_children() {
    let (concluded, value) = five_subgroups(
        CurricularRuleKind::DegreeModulesSelectionLimit {
            min_modules: 3,
            max_modules: 3,
        },
        0,
    );
    assert!(!concluded);
    assert_eq!(value, RuleValue::False);
}

#[test]
fn test_credits_limit_counts_unruled_children() {
    let (concluded, _) = five_subgroups(
        CurricularRuleKind::CreditsLimit {
            min_credits: 18.0,
            max_credits: 30.0,
        },
        0,
    );
    assert!(concluded);
}

#[test]
fn test_selection_limit_counts_concluded_ruled_children() {
    let (concluded, _) = five_subgroups(
        CurricularRuleKind::DegreeModulesSelectionLimit {
            min_modules: 3,
            max_modules: 3,
        },
        3,
    );
    assert!(concluded);
}

// ==========================================
// 无规则课程组
// ==========================================

#[test]
fn test_empty_group_is_concluded_but_cannot_conclude() {
    let cal = two_year_calendar();
    let mut plan = empty_plan();
    let root = plan.root();
    let free = group(&mut plan, &cal, root, "Livre");

    let mut student = StudentCurricularPlan::new("A1", &plan);
    let g = student.ensure_group_path(&[root, free]).unwrap();
    let engine = ConclusionEngine::new(&plan, &cal.calendar, &student);

    assert!(engine.is_concluded(g, cal.s11).is_true());
    let can = engine.can_conclude(g, cal.s11);
    assert!(can.is_false());
    assert_eq!(can.messages[0].key, "label.curriculumGroup.empty.cannot.conclude");
}

#[test]
fn test_unruled_group_checks_each_line() {
    let cal = two_year_calendar();
    let mut plan = empty_plan();
    let root = plan.root();
    let a = course(&mut plan, &cal, root, "Álgebra", 1, 1);

    let mut student = StudentCurricularPlan::new("A1", &plan);
    let root_group = student.root_group();
    student.enrol(root_group, a, 6.0, cal.s11).unwrap();

    let engine = ConclusionEngine::new(&plan, &cal.calendar, &student);
    let concluded = engine.is_concluded(root_group, cal.s11);
    assert!(concluded.is_false());
    assert_eq!(concluded.messages[0].key, "label.curriculumLine.not.approved");
    assert_eq!(concluded.messages[0].degree_module, Some(a));
    assert!(engine.can_conclude(root_group, cal.s11).is_true());
}

#[test]
fn test_unknown_group_is_unknown() {
    let cal = two_year_calendar();
    let plan = empty_plan();
    let student = StudentCurricularPlan::new("A1", &plan);
    let engine = ConclusionEngine::new(&plan, &cal.calendar, &student);

    let result = engine.is_concluded(CurriculumGroupId(99), cal.s11);
    assert_eq!(result.value, RuleValue::Unknown);
    assert_eq!(result.severity, Severity::Warning);
}

// ==========================================
// 幂等与结业检查点
// ==========================================

#[test]
fn test_evaluation_is_idempotent() {
    let cal = two_year_calendar();
    let mut plan = empty_plan();
    let root = plan.root();
    let options = group(&mut plan, &cal, root, "Opções");
    let a = course(&mut plan, &cal, options, "Álgebra", 1, 1);
    add_rule(
        &mut plan,
        &cal,
        options,
        CurricularRuleKind::CreditsLimit {
            min_credits: 12.0,
            max_credits: 12.0,
        },
    );

    let mut student = StudentCurricularPlan::new("A1", &plan);
    let g = student.ensure_group_path(&[root, options]).unwrap();
    student.enrol(g, a, 6.0, cal.s11).unwrap();

    let engine = ConclusionEngine::new(&plan, &cal.calendar, &student);
    assert_eq!(engine.is_concluded(g, cal.s11), engine.is_concluded(g, cal.s11));
    assert_eq!(engine.can_conclude(g, cal.s11), engine.can_conclude(g, cal.s11));
}

#[test]
fn test_conclusion_summaries_for_tagged_groups() {
    let cal = two_year_calendar();
    let mut plan = empty_plan();
    let root = plan.root();
    let first_cycle = group(&mut plan, &cal, root, "Primeiro Ciclo");
    let a = course(&mut plan, &cal, first_cycle, "Álgebra", 1, 1);
    plan.set_program_conclusion(
        first_cycle,
        Some(ProgramConclusion {
            name: "Licenciatura".to_string(),
        }),
    )
    .unwrap();

    let mut student = StudentCurricularPlan::new("A1", &plan);
    let g = student.ensure_group_path(&[root, first_cycle]).unwrap();
    let line = student.enrol(g, a, 6.0, cal.s11).unwrap();
    student.approve(line).unwrap();

    let engine = ConclusionEngine::new(&plan, &cal.calendar, &student);
    let summaries = engine.conclusion_summaries(cal.s11);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].curriculum_group, g);
    assert_eq!(summaries[0].program_conclusion, "Licenciatura");
    assert_eq!(summaries[0].approved_credits, 6.0);
    assert!(summaries[0].concluded.is_true());
    assert!(student.group(g).is_some());
}
