// src/model/elements.rs

/// Element symbols indexed by atomic number (index 0 is a dummy).
const SYMBOLS: [&str; 119] = [
    "X",
    // --- Period 1-2 ---
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    // --- Period 3 ---
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar",
    // --- Period 4 ---
    "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se",
    "Br", "Kr",
    // --- Period 5 ---
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", "Sb", "Te",
    "I", "Xe",
    // --- Period 6 ---
    "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn",
    // --- Period 7 ---
    "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No",
    "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Returns the atomic number (Z) for an element symbol, 0 if unknown.
///
/// Labels such as "Fe1" or "O_a" (common in POSCAR species lines written by
/// other tools) are reduced to their leading alphabetic symbol first.
pub fn get_atomic_number(element: &str) -> i32 {
    let symbol: String = element
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect();

    SYMBOLS
        .iter()
        .position(|s| *s == symbol)
        .or_else(|| {
            // "Fe1" -> "Fe", but "Oa" -> "O"
            let one: String = symbol.chars().take(1).collect();
            SYMBOLS.iter().position(|s| *s == one)
        })
        .filter(|&z| z > 0)
        .map(|z| z as i32)
        .unwrap_or(0)
}

/// Integer species ids for a symmetry search: the atomic number where known,
/// otherwise a distinct id above the periodic table so unknown labels are
/// still told apart.
pub fn species_numbers(elements: &[String]) -> Vec<i32> {
    let mut unknown: Vec<&str> = Vec::new();
    elements
        .iter()
        .map(|el| match get_atomic_number(el) {
            0 => {
                let idx = match unknown.iter().position(|u| *u == el.as_str()) {
                    Some(i) => i,
                    None => {
                        unknown.push(el.as_str());
                        unknown.len() - 1
                    }
                };
                SYMBOLS.len() as i32 + idx as i32
            }
            z => z,
        })
        .collect()
}
