//! Public guidance attached to each alert level.
//!
//! The text is what residents see on banners and notifications, so it stays
//! in Portuguese. Probabilities and lead times are the fixed figures the
//! civil defence dashboard publishes per level; they are not derived from
//! the current reading.

use serde::Serialize;

use crate::model::AlertLevel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    pub level: AlertLevel,
    pub title: &'static str,
    pub message: &'static str,
    /// Short call to action shown next to the banner.
    pub action: &'static str,
    /// Whether the level warrants pushing a notification.
    pub notify: bool,
    /// Emergency instructions. Empty when there is nothing to do.
    pub instructions: &'static [&'static str],
    /// Estimated flood probability, in percent.
    pub flood_probability_pct: u8,
    pub time_to_flood: &'static str,
    pub affected_areas: &'static [&'static str],
    pub recommendations: &'static [&'static str],
    /// One-line summary for the prediction panel. `None` for baixo.
    pub headline: Option<&'static str>,
}

static BAIXO: Advisory = Advisory {
    level: AlertLevel::Baixo,
    title: "SITUAÇÃO NORMAL",
    message: "Condições meteorológicas normais. Monitoramento contínuo ativo.",
    action: "Situação Controlada",
    notify: false,
    instructions: &[],
    flood_probability_pct: 10,
    time_to_flood: "> 48 horas",
    affected_areas: &[],
    recommendations: &["Situação normal", "Monitoramento contínuo"],
    headline: None,
};

static MEDIO: Advisory = Advisory {
    level: AlertLevel::Medio,
    title: "ALERTA MÉDIO DE ENCHENTE",
    message: "Monitoramento intensificado. Possibilidade de enchente nas próximas 12-24 horas.",
    action: "Monitorar Situação",
    notify: true,
    instructions: &[
        "Monitore constantemente os alertas",
        "Prepare kit de emergência",
        "Evite áreas próximas ao rio",
        "Mantenha telefone carregado",
    ],
    flood_probability_pct: 35,
    time_to_flood: "12-24 horas",
    affected_areas: &["Áreas ribeirinhas"],
    recommendations: &["Monitorar situação", "Preparar kit emergência"],
    headline: Some("ALERTA MÉDIO: Monitore a situação e mantenha-se preparado."),
};

static ALTO: Advisory = Advisory {
    level: AlertLevel::Alto,
    title: "ALERTA ALTO DE ENCHENTE",
    message: "Condições meteorológicas indicam alto risco de enchente nas próximas 6-8 horas.",
    action: "Preparar Evacuação",
    notify: true,
    instructions: &[
        "Prepare-se para possível evacuação",
        "Mova veículos para locais seguros",
        "Estocar água e alimentos não perecíveis",
        "Mantenha documentos importantes seguros",
    ],
    flood_probability_pct: 65,
    time_to_flood: "6-8 horas",
    affected_areas: &["Centro", "Vila Nova"],
    recommendations: &["Preparar evacuação", "Mover veículos", "Estocar suprimentos"],
    headline: Some("ALERTA ALTO: Condições favoráveis para enchentes. Prepare-se."),
};

static CRITICO: Advisory = Advisory {
    level: AlertLevel::Critico,
    title: "ALERTA CRÍTICO DE ENCHENTE",
    message: "Risco iminente de enchente em Blumenau. Evacuação imediata recomendada para áreas de risco.",
    action: "Evacuação Imediata",
    notify: true,
    instructions: &[
        "Evacuação IMEDIATA das áreas de risco",
        "Siga as rotas de evacuação estabelecidas",
        "Dirija-se aos pontos de abrigo mais próximos",
        "Mantenha contato com autoridades locais",
    ],
    flood_probability_pct: 85,
    time_to_flood: "2-4 horas",
    affected_areas: &["Centro", "Vila Nova", "Ponta Aguda"],
    recommendations: &["Evacuação imediata", "Evitar áreas baixas", "Seguir rotas de emergência"],
    headline: Some("ALERTA CRÍTICO: Risco iminente de enchente. Siga as orientações de evacuação."),
};

pub fn advisory_for(level: AlertLevel) -> &'static Advisory {
    match level {
        AlertLevel::Baixo => &BAIXO,
        AlertLevel::Medio => &MEDIO,
        AlertLevel::Alto => &ALTO,
        AlertLevel::Critico => &CRITICO,
    }
}
