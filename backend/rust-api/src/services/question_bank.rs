//! Canned practice questions.

use crate::models::labels::{QuestionType, Topic};
use crate::models::practice::PracticeTemplate;

pub const TEMPLATES: &[PracticeTemplate] = &[
    PracticeTemplate {
        id: "cards-adhf-01",
        topic: Topic::Cardiology,
        question_type: QuestionType::Management,
        stem: "A 67-year-old man with known heart failure presents with 3 days of worsening \
               dyspnea and orthopnea. JVP is elevated, there are bibasilar crackles and 2+ \
               pitting edema. BP is 148/90 mm Hg and SpO2 is 91% on room air. What is the next \
               best step in management?",
        options: [
            "IV loop diuretic",
            "Oral metoprolol uptitration",
            "Emergent coronary angiography",
            "IV normal saline bolus",
            "Outpatient echocardiogram",
        ],
        explanation: "Volume-overloaded acute decompensated heart failure with adequate blood \
                      pressure is treated first-line with IV loop diuretics. Beta-blockers are \
                      not uptitrated during decompensation.",
    },
    PracticeTemplate {
        id: "cards-afib-01",
        topic: Topic::Cardiology,
        question_type: QuestionType::Management,
        stem: "A 72-year-old woman with hypertension and diabetes is found to have atrial \
               fibrillation on a routine ECG. She is hemodynamically stable with a rate of 82/min. \
               Which of the following is most appropriate to reduce her stroke risk?",
        options: [
            "Apixaban",
            "Aspirin alone",
            "No anticoagulation",
            "Emergent cardioversion",
            "Clopidogrel alone",
        ],
        explanation: "Her CHA2DS2-VASc score is at least 4, so oral anticoagulation with a DOAC \
                      is indicated. Antiplatelet therapy alone is inferior.",
    },
    PracticeTemplate {
        id: "pulm-pe-01",
        topic: Topic::Pulmonology,
        question_type: QuestionType::Workup,
        stem: "A 34-year-old woman on oral contraceptives has sudden pleuritic chest pain and \
               tachycardia two days after a long flight. Creatinine is normal. What is the most \
               appropriate test to confirm the suspected diagnosis?",
        options: [
            "CT pulmonary angiography",
            "Chest x-ray only",
            "Serum troponin",
            "Pulmonary function tests",
            "Transthoracic echocardiogram",
        ],
        explanation: "With a high pretest probability of pulmonary embolism and normal renal \
                      function, CT pulmonary angiography is the diagnostic test of choice.",
    },
    PracticeTemplate {
        id: "renal-hyperk-01",
        topic: Topic::Nephrology,
        question_type: QuestionType::Management,
        stem: "A 58-year-old man with CKD stage 4 has a potassium of 7.1 mEq/L and peaked T \
               waves on ECG. What is the next best step?",
        options: [
            "IV calcium gluconate",
            "Oral sodium polystyrene sulfonate",
            "Repeat potassium in 6 hours",
            "IV normal saline",
            "Oral furosemide",
        ],
        explanation: "Hyperkalemia with ECG changes requires immediate membrane stabilization \
                      with IV calcium before shifting or removing potassium.",
    },
    PracticeTemplate {
        id: "endo-dka-01",
        topic: Topic::Endocrine,
        question_type: QuestionType::Management,
        stem: "A 19-year-old with type 1 diabetes presents with vomiting, Kussmaul respirations, \
               glucose 520 mg/dL and an anion gap of 24. Potassium is 4.6 mEq/L. What is the \
               initial management?",
        options: [
            "IV isotonic fluids",
            "IV sodium bicarbonate",
            "Subcutaneous insulin glargine",
            "IV potassium before any fluids",
            "Oral rehydration",
        ],
        explanation: "DKA management begins with aggressive IV isotonic fluids, followed by an \
                      insulin infusion once potassium is confirmed above 3.3 mEq/L.",
    },
    PracticeTemplate {
        id: "gi-ibs-01",
        topic: Topic::Gastroenterology,
        question_type: QuestionType::Management,
        stem: "A 28-year-old woman has 8 months of intermittent crampy lower abdominal pain \
               that improves after defecation, alternating with loose stools. She has no \
               weight loss, bleeding or nocturnal symptoms. What is the most appropriate next \
               step?",
        options: [
            "Reassurance and dietary modification",
            "Colonoscopy",
            "CT of the abdomen",
            "Empiric ciprofloxacin",
            "Exploratory laparoscopy",
        ],
        explanation: "Symptoms meet Rome IV criteria for irritable bowel syndrome without alarm \
                      features. No further testing is necessary; reassurance and dietary \
                      changes come first.",
    },
    PracticeTemplate {
        id: "id-meningitis-01",
        topic: Topic::InfectiousDisease,
        question_type: QuestionType::Management,
        stem: "A 22-year-old college student has fever, headache, neck stiffness and a petechial \
               rash. There are no focal neurologic deficits. What should be done first?",
        options: [
            "Blood cultures then empiric IV antibiotics",
            "MRI of the brain before any treatment",
            "Oral amoxicillin and discharge",
            "Wait for lumbar puncture results before antibiotics",
            "Acyclovir alone",
        ],
        explanation: "Suspected bacterial meningitis is treated with empiric antibiotics \
                      immediately after blood cultures; treatment must not be delayed for \
                      imaging or CSF results.",
    },
    PracticeTemplate {
        id: "heme-ida-01",
        topic: Topic::HemeOnc,
        question_type: QuestionType::Diagnosis,
        stem: "A 45-year-old man has fatigue and a microcytic anemia. Ferritin is low and RDW \
               is elevated. What is the most likely diagnosis?",
        options: [
            "Iron deficiency anemia",
            "Beta-thalassemia minor",
            "Anemia of chronic disease",
            "Sideroblastic anemia",
            "Vitamin B12 deficiency",
        ],
        explanation: "Low ferritin with microcytosis and high RDW indicates iron deficiency. In \
                      an adult man, an occult GI source must then be sought.",
    },
    PracticeTemplate {
        id: "obgyn-preeclampsia-01",
        topic: Topic::Obgyn,
        question_type: QuestionType::Management,
        stem: "A 31-year-old pregnant woman at 35 weeks has BP 168/112 mm Hg, headache and \
               proteinuria. What is the most appropriate medication to prevent seizures?",
        options: [
            "Magnesium sulfate",
            "Phenytoin",
            "Lorazepam",
            "Levetiracetam",
            "Valproic acid",
        ],
        explanation: "Preeclampsia with severe features is treated with magnesium sulfate for \
                      seizure prophylaxis along with BP control and delivery planning.",
    },
    PracticeTemplate {
        id: "peds-bronchiolitis-01",
        topic: Topic::Pediatrics,
        question_type: QuestionType::Management,
        stem: "A 4-month-old infant has rhinorrhea, cough and diffuse wheezes during RSV \
               season. SpO2 is 95% and the infant is feeding well. What is the best management?",
        options: [
            "Supportive care with nasal suction",
            "Nebulized albuterol every 4 hours",
            "Oral prednisolone",
            "IV ceftriaxone",
            "Chest physiotherapy",
        ],
        explanation: "Bronchiolitis is managed supportively. Bronchodilators, steroids and \
                      antibiotics are not recommended.",
    },
    PracticeTemplate {
        id: "psych-mdd-01",
        topic: Topic::Psych,
        question_type: QuestionType::Management,
        stem: "A 40-year-old man reports 6 weeks of low mood, anhedonia, poor sleep and guilt. \
               He has no history of mania. What is the first-line pharmacotherapy?",
        options: [
            "Sertraline",
            "Lithium",
            "Haloperidol",
            "Alprazolam",
            "Methylphenidate",
        ],
        explanation: "SSRIs are first-line therapy for major depressive disorder because of \
                      efficacy and tolerability.",
    },
    PracticeTemplate {
        id: "surg-appendicitis-01",
        topic: Topic::SurgeryAcute,
        question_type: QuestionType::Diagnosis,
        stem: "A 20-year-old man has periumbilical pain migrating to the right lower quadrant, \
               anorexia and low-grade fever. There is rebound tenderness at McBurney point. What \
               is the most likely diagnosis?",
        options: [
            "Acute appendicitis",
            "Mesenteric adenitis",
            "Crohn disease flare",
            "Nephrolithiasis",
            "Testicular torsion",
        ],
        explanation: "Migratory pain to the right lower quadrant with anorexia, fever and \
                      McBurney point tenderness is classic for acute appendicitis.",
    },
];

pub fn find(id: &str) -> Option<&'static PracticeTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Templates for one topic, or the whole bank.
pub fn templates_for(topic: Option<Topic>) -> Vec<&'static PracticeTemplate> {
    TEMPLATES
        .iter()
        .filter(|t| match topic {
            Some(wanted) => t.topic == wanted,
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn template_ids_are_unique() {
        let ids: HashSet<&str> = TEMPLATES.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), TEMPLATES.len());
    }

    #[test]
    fn options_are_distinct_and_non_empty() {
        for template in TEMPLATES {
            let options: HashSet<&str> = template.options.iter().copied().collect();
            assert_eq!(options.len(), 5, "{} repeats an option", template.id);
            assert!(options.iter().all(|o| !o.trim().is_empty()));
        }
    }

    #[test]
    fn topic_filter_narrows_bank() {
        let cards = templates_for(Some(Topic::Cardiology));
        assert_eq!(cards.len(), 2);
        assert!(cards.iter().all(|t| t.topic == Topic::Cardiology));
        assert_eq!(templates_for(None).len(), TEMPLATES.len());
        assert!(templates_for(Some(Topic::GeneralIm)).is_empty());
        assert_eq!(find("gi-ibs-01").unwrap().topic, Topic::Gastroenterology);
    }
}
