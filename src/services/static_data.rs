//! Static Catalogue
//!
//! Served by `/api/sdgs` and `/api/projects` when `DB_STATUS` marks the
//! database as offline. Names and colors match `migrations/0002_sdg_catalogue.sql`;
//! static SDG ids equal their numbers.

use chrono::{DateTime, TimeZone, Utc};

use crate::db::{Project, Sdg};

/// (번호, 이름, 설명, 색상)
const SDGS: [(i16, &str, &str, &str); 17] = [
    (1, "Erradicação da Pobreza", "Acabar com a pobreza em todas as suas formas, em todos os lugares", "#E5243B"),
    (2, "Fome Zero e Agricultura Sustentável", "Acabar com a fome, alcançar a segurança alimentar e promover a agricultura sustentável", "#DDA63A"),
    (3, "Saúde e Bem-Estar", "Assegurar uma vida saudável e promover o bem-estar para todos", "#4C9F38"),
    (4, "Educação de Qualidade", "Assegurar a educação inclusiva, equitativa e de qualidade", "#C5192D"),
    (5, "Igualdade de Género", "Alcançar a igualdade de género e empoderar todas as mulheres e raparigas", "#FF3A21"),
    (6, "Água Potável e Saneamento", "Garantir a disponibilidade e a gestão sustentável da água e saneamento", "#26BDE2"),
    (7, "Energia Limpa e Acessível", "Garantir o acesso a fontes de energia fiáveis, sustentáveis e modernas", "#FCC30B"),
    (8, "Trabalho Digno e Crescimento Económico", "Promover o crescimento económico inclusivo e sustentável e o emprego digno", "#A21942"),
    (9, "Indústria, Inovação e Infraestruturas", "Construir infraestruturas resilientes e fomentar a inovação", "#FD6925"),
    (10, "Reduzir as Desigualdades", "Reduzir as desigualdades no interior dos países e entre países", "#DD1367"),
    (11, "Cidades e Comunidades Sustentáveis", "Tornar as cidades inclusivas, seguras, resilientes e sustentáveis", "#FD9D24"),
    (12, "Produção e Consumo Sustentáveis", "Garantir padrões de consumo e de produção sustentáveis", "#BF8B2E"),
    (13, "Ação Climática", "Adotar medidas urgentes para combater as alterações climáticas e os seus impactos", "#3F7E44"),
    (14, "Proteger a Vida Marinha", "Conservar e usar de forma sustentável os oceanos, mares e recursos marinhos", "#0A97D9"),
    (15, "Proteger a Vida Terrestre", "Proteger, restaurar e promover o uso sustentável dos ecossistemas terrestres", "#56C02B"),
    (16, "Paz, Justiça e Instituições Eficazes", "Promover sociedades pacíficas e inclusivas e instituições eficazes", "#00689D"),
    (17, "Parcerias para a Implementação dos Objetivos", "Reforçar os meios de implementação e revitalizar a parceria global", "#19486A"),
];

/// (id, 이름, 설명, 이미지, ODS 번호)
const PROJECTS: [(i64, &str, &str, &str, i16); 4] = [
    (1, "Furos de Água Comunitários", "Abertura de furos de água potável em comunidades rurais", "/uploads/projects/furos-agua.jpg", 6),
    (2, "Painéis Solares nas Escolas", "Instalação de painéis solares em escolas primárias", "/uploads/projects/paineis-solares.jpg", 7),
    (3, "Reflorestação do Mayombe", "Plantação de espécies nativas na floresta do Mayombe", "/uploads/projects/mayombe.jpg", 13),
    (4, "Mangais de Luanda", "Recuperação dos mangais da baía de Luanda", "/uploads/projects/mangais.jpg", 14),
];

/// 17개 ODS (번호 순)
pub fn sdgs() -> Vec<Sdg> {
    SDGS.iter()
        .map(|&(number, name, description, color)| Sdg {
            id: i64::from(number),
            number,
            name: name.to_string(),
            description: Some(description.to_string()),
            color: Some(color.to_string()),
        })
        .collect()
}

/// 정적 프로젝트 (투자 합계 0), ODS id로 필터 가능
pub fn projects(sdg_id: Option<i64>) -> Vec<Project> {
    let created_at: DateTime<Utc> = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();

    PROJECTS
        .iter()
        .filter(|p| sdg_id.map_or(true, |id| id == i64::from(p.4)))
        .map(|&(id, name, description, image_url, sdg_number)| Project {
            id,
            name: name.to_string(),
            description: Some(description.to_string()),
            image_url: Some(image_url.to_string()),
            sdg_id: i64::from(sdg_number),
            sdg_number,
            total_invested: 0.0,
            created_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_seventeen_sdgs_in_order() {
        let sdgs = sdgs();
        assert_eq!(sdgs.len(), 17);
        for (i, sdg) in sdgs.iter().enumerate() {
            assert_eq!(sdg.number as usize, i + 1);
            assert_eq!(sdg.id, i64::from(sdg.number));
            assert!(sdg.color.as_deref().is_some_and(|c| c.starts_with('#')));
        }
        assert_eq!(sdgs[12].name, "Ação Climática");
    }

    #[test]
    fn test_projects_filter_by_sdg() {
        assert_eq!(projects(None).len(), 4);
        let water = projects(Some(6));
        assert_eq!(water.len(), 1);
        assert_eq!(water[0].sdg_number, 6);
        assert!(projects(Some(1)).is_empty());
        assert!(projects(None).iter().all(|p| p.total_invested == 0.0));
    }
}
