// ==========================================
// 先修学年规则集成测试
// ==========================================
// 测试目标: 学年 / 学期校验粒度下的第2学年选课
// ==========================================


use curricular_engine::domain::{
    CurricularRuleKind, CurriculumReadModel, EnrolmentModelConfig, EnrolmentModelConfigEntry,
    StudentCurricularPlan,
};
use curricular_engine::engine::{EnrolmentContext, EnrolmentError, EnrolmentPipeline};
use curricular_engine::EnrolmentModel;
use test_helpers::{add_rule, course, sequenced_plan, two_year_calendar};

const MISSING_KEY: &str =
    "label.PreviousYearsEnrolmentCurricularRule.enrolment.previous.years.missing";

#[test]
fn test_year_model_requires_full_previous_year() {
    curricular_engine::logging::init_test();
    let cal = two_year_calendar();
    let fixture = sequenced_plan(&cal);
    let plan = &fixture.plan;
    let pipeline = EnrolmentPipeline::new(plan, &cal.calendar);

    let mut student = StudentCurricularPlan::new("A1", plan);
    let root = student.root_group();
    let line = student.enrol(root, fixture.calculus_1, 6.0, cal.s11).unwrap();
    student.approve(line).unwrap();

    // 第1学年第2学期未覆盖
    let ctx = EnrolmentContext::new(cal.s21).with_module(fixture.analysis);
    let err = pipeline.enrol(&mut student, &ctx).unwrap_err();
    assert_eq!(err.rejection_key(), Some(MISSING_KEY));
    match err {
        EnrolmentError::Rejected { module, messages, .. } => {
            assert_eq!(module, fixture.analysis);
            assert!(messages[0].args[1].contains("Cálculo II"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(student.active_line_for(fixture.analysis).is_none());

    // 第1学年全部选课后可选
    student.enrol(root, fixture.calculus_2, 6.0, cal.s12).unwrap();
    let result = pipeline.enrol(&mut student, &ctx).unwrap();
    assert!(result.is_success());
    assert!(student.active_line_for(fixture.analysis).is_some());
}

#[test]
fn test_same_batch_enrolment_covers_previous_year() {
    let cal = two_year_calendar();
    let fixture = sequenced_plan(&cal);
    let plan = &fixture.plan;
    let pipeline = EnrolmentPipeline::new(plan, &cal.calendar);

    let mut student = StudentCurricularPlan::new("A1", plan);
    let ctx = EnrolmentContext::new(cal.s21)
        .with_module(fixture.calculus_1)
        .with_module(fixture.calculus_2)
        .with_module(fixture.analysis);
    let result = pipeline.enrol(&mut student, &ctx).unwrap();
    assert_eq!(result.outcomes.len(), 3);
}

#[test]
fn test_removed_line_no_longer_covers() {
    let cal = two_year_calendar();
    let fixture = sequenced_plan(&cal);
    let plan = &fixture.plan;
    let pipeline = EnrolmentPipeline::new(plan, &cal.calendar);

    let mut student = StudentCurricularPlan::new("A1", plan);
    let root = student.root_group();
    student.enrol(root, fixture.calculus_1, 6.0, cal.s11).unwrap();
    let second = student.enrol(root, fixture.calculus_2, 6.0, cal.s12).unwrap();

    let ctx = EnrolmentContext::new(cal.s21)
        .with_module(fixture.analysis)
        .removing(second);
    let err = pipeline.evaluate(&student, &ctx).unwrap_err();
    assert_eq!(err.rejection_key(), Some(MISSING_KEY));
}

#[test]
fn test_semester_split_allows_first_semester_of_next_year() {
    curricular_engine::logging::init_test();
    let cal = two_year_calendar();

    // 默认学年粒度: 缺第1学年第2学期被拒
    let fixture = sequenced_plan(&cal);
    let mut student = StudentCurricularPlan::new("A1", &fixture.plan);
    let root = student.root_group();
    let line = student.enrol(root, fixture.calculus_1, 6.0, cal.s11).unwrap();
    student.approve(line).unwrap();
    let ctx = EnrolmentContext::new(cal.s21).with_module(fixture.analysis);
    let err = EnrolmentPipeline::new(&fixture.plan, &cal.calendar)
        .evaluate(&student, &ctx)
        .unwrap_err();
    assert_eq!(err.rejection_key(), Some(MISSING_KEY));

    // 学期粒度: 第1学期只要求之前学年的第1学期
    let mut semester_fixture = sequenced_plan(&cal);
    semester_fixture.plan.set_enrolment_model(EnrolmentModel::Semester);
    let result = EnrolmentPipeline::new(&semester_fixture.plan, &cal.calendar)
        .evaluate(&student, &ctx)
        .unwrap();
    assert!(result.is_success());

    // 第2学期仍要求第1学年第2学期
    let ctx = EnrolmentContext::new(cal.s22).with_module(semester_fixture.topology);
    let err = EnrolmentPipeline::new(&semester_fixture.plan, &cal.calendar)
        .evaluate(&student, &ctx)
        .unwrap_err();
    assert_eq!(err.rejection_key(), Some(MISSING_KEY));
}

#[test]
fn test_explicit_config_overrides_model() {
    let cal = two_year_calendar();
    let mut fixture = sequenced_plan(&cal);
    fixture.plan.set_enrolment_model(EnrolmentModel::Year);
    fixture
        .plan
        .set_enrolment_model_config(Some(EnrolmentModelConfig {
            entries: vec![
                EnrolmentModelConfigEntry::new([1]),
                EnrolmentModelConfigEntry::new([2]),
            ],
        }))
        .unwrap();

    let mut student = StudentCurricularPlan::new("A1", &fixture.plan);
    let root = student.root_group();
    let line = student.enrol(root, fixture.calculus_1, 6.0, cal.s11).unwrap();
    student.approve(line).unwrap();

    let ctx = EnrolmentContext::new(cal.s21).with_module(fixture.analysis);
    let result = EnrolmentPipeline::new(&fixture.plan, &cal.calendar).evaluate(&student, &ctx);
    assert!(result.is_ok());
}

#[test]
fn test_satisfiable_group_requires_nothing() {
    let cal = two_year_calendar();
    let mut fixture = sequenced_plan(&cal);
    let root = fixture.plan.root();
    // 第1学年选修课组: 两门中任选一门即可
    let electives = fixture.plan.add_course_group("Opções do 1º Ano");
    let period = fixture.plan.periods_mut().semester(1, 2).unwrap();
    fixture
        .plan
        .add_context(
            &cal.calendar,
            root,
            electives,
            period,
            curricular_engine::ValidityWindow::open(cal.s11),
            9,
        )
        .unwrap();
    let chosen = course(&mut fixture.plan, &cal, electives, "Geometria", 1, 2);
    course(&mut fixture.plan, &cal, electives, "Estatística", 1, 2);
    add_rule(
        &mut fixture.plan,
        &cal,
        electives,
        CurricularRuleKind::CreditsLimit {
            min_credits: 6.0,
            max_credits: 6.0,
        },
    );

    let mut student = StudentCurricularPlan::new("A1", &fixture.plan);
    let root_group = student.root_group();
    for module in [fixture.calculus_1, fixture.calculus_2] {
        let line = student.enrol(root_group, module, 6.0, cal.s11).unwrap();
        student.approve(line).unwrap();
    }
    let electives_group = student.ensure_group_path(&[root, electives]).unwrap();
    student.enrol(electives_group, chosen, 6.0, cal.s12).unwrap();

    let ctx = EnrolmentContext::new(cal.s21).with_module(fixture.analysis);
    let result = EnrolmentPipeline::new(&fixture.plan, &cal.calendar).evaluate(&student, &ctx);
    assert!(result.is_ok());
}

#[test]
fn test_whole_year_and_trimester_contexts_follow_validation_group() {
    let cal = two_year_calendar();
    let mut fixture = sequenced_plan(&cal);
    let root = fixture.plan.root();
    let whole_year = fixture.plan.periods_mut().year(1).unwrap();
    let second_semester_trimester = fixture.plan.periods_mut().trimester(1, 2, 1).unwrap();
    let annual = fixture
        .plan
        .add_curricular_course("Projeto Anual", "PROJETO_ANUAL", 6.0)
        .unwrap();
    let seminar = fixture.plan.add_curricular_course("Seminário", "SEMINARIO", 6.0).unwrap();
    for (order, (module, period)) in [(annual, whole_year), (seminar, second_semester_trimester)]
        .into_iter()
        .enumerate()
    {
        fixture
            .plan
            .add_context(
                &cal.calendar,
                root,
                module,
                period,
                curricular_engine::ValidityWindow::open(cal.s11),
                7 + order as u32,
            )
            .unwrap();
    }

    let mut student = StudentCurricularPlan::new("A1", &fixture.plan);
    let root_group = student.root_group();
    let line = student.enrol(root_group, fixture.calculus_1, 6.0, cal.s11).unwrap();
    student.approve(line).unwrap();
    let ctx = EnrolmentContext::new(cal.s21).with_module(fixture.analysis);

    // 学年粒度: 第1学年整学年与季度课程都要求
    let err = EnrolmentPipeline::new(&fixture.plan, &cal.calendar)
        .evaluate(&student, &ctx)
        .unwrap_err();
    match err {
        EnrolmentError::Rejected { messages, .. } => {
            let names = &messages[0].args[1];
            assert!(names.contains("Projeto Anual"));
            assert!(names.contains("Seminário"));
            assert!(names.contains("Cálculo II"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // 学期粒度: 第1学期只要求与第1学期重叠的位置, 整学年课程仍在其中
    fixture.plan.set_enrolment_model(EnrolmentModel::Semester);
    let pipeline = EnrolmentPipeline::new(&fixture.plan, &cal.calendar);
    let err = pipeline.evaluate(&student, &ctx).unwrap_err();
    assert_eq!(err.rejection_key(), Some(MISSING_KEY));
    match err {
        EnrolmentError::Rejected { messages, .. } => {
            let names = &messages[0].args[1];
            assert!(names.contains("Projeto Anual"));
            assert!(!names.contains("Seminário"));
            assert!(!names.contains("Cálculo II"));
        }
        other => panic!("unexpected error: {other}"),
    }

    student.enrol(root_group, annual, 6.0, cal.s11).unwrap();
    assert!(pipeline.evaluate(&student, &ctx).is_ok());
}
