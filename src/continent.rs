//! Country-name to continent lookup for the birth-country grouping.
//!
//! {Serbia, Montenegro, "Serbia and Montenegro"} fold into "Europe" before
//! the general lookup. Names without a known continent fall back to the
//! country name itself, so an unmapped country still forms its own group.

pub fn region_label(country: &str) -> String {
    let name = country.trim();
    if matches!(name, "Serbia" | "Montenegro" | "Serbia and Montenegro") {
        return "Europe".to_string();
    }
    continent_of(name)
        .map(str::to_string)
        .unwrap_or_else(|| name.to_string())
}

fn continent_of(name: &str) -> Option<&'static str> {
    let continent = match name {
        "Albania" | "Andorra" | "Austria" | "Belarus" | "Belgium"
        | "Bosnia and Herzegovina" | "Bulgaria" | "Croatia" | "Cyprus"
        | "Czech Republic" | "Denmark" | "Estonia" | "Finland" | "France"
        | "Germany" | "Greece" | "Hungary" | "Iceland" | "Ireland" | "Italy"
        | "Kosovo" | "Latvia" | "Liechtenstein" | "Lithuania" | "Luxembourg"
        | "Malta" | "Moldova" | "Monaco" | "Netherlands"
        | "North Macedonia" | "Norway" | "Poland" | "Portugal" | "Romania"
        | "Russia" | "San Marino" | "Slovakia" | "Slovenia" | "Spain"
        | "Sweden" | "Switzerland" | "Ukraine" | "United Kingdom"
        | "Vatican City (Holy See)" => "Europe",
        "Armenia" | "Azerbaijan" | "Bangladesh" | "China" | "Georgia"
        | "India" | "Indonesia" | "Iran" | "Iraq" | "Israel" | "Japan"
        | "Jordan" | "Kazakhstan" | "Lebanon" | "Malaysia" | "Pakistan"
        | "Philippines" | "Saudi Arabia" | "Singapore" | "South Korea"
        | "Taiwan" | "Thailand" | "Turkey" | "United Arab Emirates"
        | "Uzbekistan" | "Vietnam" => "Asia",
        "Algeria" | "Egypt" | "Ethiopia" | "Ghana" | "Kenya" | "Morocco"
        | "Nigeria" | "South Africa" | "Sudan" | "Tunisia" => "Africa",
        "Canada" | "Costa Rica" | "Cuba" | "Dominican Republic"
        | "Guatemala" | "Jamaica" | "Mexico" | "Panama" | "United States" => {
            "North America"
        }
        "Argentina" | "Bolivia" | "Brazil" | "Chile" | "Colombia" | "Ecuador"
        | "Paraguay" | "Peru" | "Uruguay" | "Venezuela" => "South America",
        "Australia" | "Fiji" | "New Zealand" | "Papua New Guinea" => "Oceania",
        _ => return None,
    };
    Some(continent)
}
