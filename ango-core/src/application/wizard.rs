use serde::Serialize;

use crate::data::prompt_model::{GenerationRequest, PromptModel};
use crate::domain::error::DomainError;

/// Каталог типов проекта, показываемый на первом шаге.
pub const PROJECT_TYPES: [&str; 10] = [
    "Landing Page",
    "Dashboard",
    "E-commerce",
    "Blog / Portfolio",
    "SaaS Application",
    "Mobile App (PWA)",
    "Admin Panel",
    "Social Platform",
    "Educational Platform",
    "Custom Application",
];

/// Предустановленный список функциональностей третьего шага.
pub const DEFAULT_FEATURES: [&str; 14] = [
    "Autenticação de utilizadores",
    "Sistema de subscrição / planos",
    "Dashboard do utilizador",
    "Geração de prompts com IA",
    "Comunidade / feed",
    "Comentários e interacções",
    "Cursos online",
    "Mentorias",
    "Upload de ficheiros",
    "Notificações",
    "Pagamentos online",
    "Painel administrativo",
    "Integração com APIs",
    "Analytics / resultados",
];

/// Стили оформления четвёртого шага.
pub const DESIGN_STYLES: [&str; 6] = [
    "Minimalista",
    "Colorido e Vibrante",
    "Elegante e Profissional",
    "Criativo e Artístico",
    "Tecnológico e Futurista",
    "Simples e Limpo",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    ProjectType,
    Description,
    Features,
    DesignStyle,
    Review,
    Result,
}

impl WizardStep {
    /// Номер шага для индикатора прогресса (1..=6).
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::ProjectType => 1,
            WizardStep::Description => 2,
            WizardStep::Features => 3,
            WizardStep::DesignStyle => 4,
            WizardStep::Review => 5,
            WizardStep::Result => 6,
        }
    }

    fn next(&self) -> Option<WizardStep> {
        match self {
            WizardStep::ProjectType => Some(WizardStep::Description),
            WizardStep::Description => Some(WizardStep::Features),
            WizardStep::Features => Some(WizardStep::DesignStyle),
            WizardStep::DesignStyle => Some(WizardStep::Review),
            // из Review дальше только finalize(), из Result — только reset()
            WizardStep::Review | WizardStep::Result => None,
        }
    }

    fn back(&self) -> Option<WizardStep> {
        match self {
            WizardStep::ProjectType | WizardStep::Result => None,
            WizardStep::Description => Some(WizardStep::ProjectType),
            WizardStep::Features => Some(WizardStep::Description),
            WizardStep::DesignStyle => Some(WizardStep::Features),
            WizardStep::Review => Some(WizardStep::DesignStyle),
        }
    }
}

/// Данные формы, собираемые по шагам.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WizardData {
    pub project_type: String,
    pub custom_type: String,
    pub description: String,
    pub features: Vec<String>,
    pub design_styles: Vec<String>,
    pub color_palette: String,
    pub observations: String,
}

/// Асинхронное обогащение отдельного поля формы. Не переводит шаг.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiAction {
    ExpandDescription,
    SuggestFeatures,
    SuggestColors,
    ImprovePrompt,
}

/// Пятишаговый мастер генерации prompt'а.
///
/// Переходы строго линейные, каждый шаг закрыт предикатом полноты.
/// Каждое обогащение пишет только в своё поле, поэтому перекрывающиеся
/// ответы разных действий друг другу не мешают.
pub struct PromptWizard<M: PromptModel> {
    model: M,
    step: WizardStep,
    data: WizardData,
    generated: Option<String>,
}

impl<M: PromptModel> PromptWizard<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            step: WizardStep::ProjectType,
            data: WizardData::default(),
            generated: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn data(&self) -> &WizardData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut WizardData {
        &mut self.data
    }

    pub fn generated(&self) -> Option<&str> {
        self.generated.as_deref()
    }

    pub fn can_advance(&self) -> bool {
        match self.step {
            WizardStep::ProjectType => {
                !self.data.project_type.is_empty() || !self.data.custom_type.is_empty()
            }
            WizardStep::Description => self.data.description.chars().count() > 10,
            WizardStep::Features => !self.data.features.is_empty(),
            WizardStep::DesignStyle => !self.data.design_styles.is_empty(),
            WizardStep::Review => true,
            WizardStep::Result => false,
        }
    }

    /// Переход вперёд. `false` — шаг не изменился (предикат не выполнен
    /// или дальше идти некуда).
    pub fn next(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        match self.step.next() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    pub fn back(&mut self) -> bool {
        match self.step.back() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    pub fn toggle_feature(&mut self, feature: &str) {
        if let Some(index) = self.data.features.iter().position(|f| f == feature) {
            self.data.features.remove(index);
        } else {
            self.data.features.push(feature.to_string());
        }
    }

    pub fn toggle_style(&mut self, style: &str) {
        if let Some(index) = self.data.design_styles.iter().position(|s| s == style) {
            self.data.design_styles.remove(index);
        } else {
            self.data.design_styles.push(style.to_string());
        }
    }

    /// Выполняет обогащение: один вызов модели, запись строго в своё поле.
    pub async fn run_action(&mut self, action: AiAction) -> Result<(), DomainError> {
        let prompt = self.action_prompt(action)?;
        let reply = self
            .model
            .generate(GenerationRequest::single_turn(prompt))
            .await?;

        match action {
            AiAction::ExpandDescription => self.data.description = reply,
            AiAction::SuggestFeatures => self.merge_features(&reply),
            AiAction::SuggestColors => self.data.color_palette = reply,
            AiAction::ImprovePrompt => self.generated = Some(reply),
        }
        Ok(())
    }

    /// Финальная генерация по всей собранной форме; переход в Result.
    pub async fn finalize(&mut self) -> Result<(), DomainError> {
        if self.step != WizardStep::Review {
            return Err(DomainError::Validation {
                field: "step",
                message: "finalize is only available from the review step",
            });
        }

        let prompt = self.final_prompt();
        let reply = self
            .model
            .generate(GenerationRequest::single_turn(prompt))
            .await?;

        self.generated = Some(reply);
        self.step = WizardStep::Result;
        Ok(())
    }

    /// Единственный переход из Result: полный сброс на первый шаг.
    pub fn reset(&mut self) {
        self.step = WizardStep::ProjectType;
        self.data = WizardData::default();
        self.generated = None;
    }

    fn merge_features(&mut self, reply: &str) {
        for feature in reply.split(',') {
            let feature = feature.trim();
            if feature.is_empty() {
                continue;
            }
            if !self.data.features.iter().any(|f| f == feature) {
                self.data.features.push(feature.to_string());
            }
        }
    }

    fn action_prompt(&self, action: AiAction) -> Result<String, DomainError> {
        let prompt = match action {
            AiAction::ExpandDescription => format!(
                "Como especialista em produtos digitais, expanda e profissionalize a seguinte \
                 descrição de projeto de forma estruturada e atraente: \"{}\". Foco em valor de \
                 negócio e clareza técnica. Retorne apenas o texto expandido.",
                self.data.description
            ),
            AiAction::SuggestFeatures => format!(
                "Com base no projeto do tipo \"{}\" e descrição \"{}\", sugira 5 funcionalidades \
                 inovadoras e essenciais. Retorne apenas uma lista simples separada por vírgulas.",
                self.data.project_type, self.data.description
            ),
            AiAction::SuggestColors => format!(
                "Sugira uma paleta de cores moderna (hexadecimais e nomes) para um projeto de \
                 estilo \"{}\". Retorne uma sugestão curta e profissional.",
                self.data.design_styles.join(", ")
            ),
            AiAction::ImprovePrompt => {
                let form = serde_json::to_string(&self.data)
                    .map_err(|err| DomainError::Unexpected(err.to_string()))?;
                format!(
                    "Melhore o seguinte prompt de desenvolvimento, tornando-o mais técnico e \
                     preciso para ser usado por IAs como Cursor, Bolt ou GPT-4: \"{form}\". \
                     Retorne o prompt completo e otimizado."
                )
            }
        };
        Ok(prompt)
    }

    fn final_prompt(&self) -> String {
        format!(
            "Crie um prompt de engenharia de software mestre para um projeto com os seguintes dados:\n\
             Tipo: {} ({})\n\
             Descrição: {}\n\
             Funcionalidades: {}\n\
             Design: {}\n\
             Paleta: {}\n\
             Observações: {}\n\n\
             O prompt deve ser formatado em Markdown, pronto para ser colado em ferramentas de \
             desenvolvimento (Bolt, Cursor, Windsurf).\n\
             Deve incluir:\n\
             - Stack recomendada\n\
             - Estrutura de arquivos sugerida\n\
             - Detalhes de UI/UX\n\
             - Regras de negócio essenciais.\n\
             Tom: Extremamente técnico e orientando a resultados rápidos (MVP).",
            self.data.project_type,
            self.data.custom_type,
            self.data.description,
            self.data.features.join(", "),
            self.data.design_styles.join(", "),
            self.data.color_palette,
            self.data.observations,
        )
    }
}
